// src/tasks/diagnostics_task.rs
use core::sync::atomic::Ordering;
use heapless::HistoryBuffer;
use rate_stabilizer::Axis;

use crate::config::hardware::system::DIAGNOSTICS_REPORT_FRAMES;
use crate::data::{CHANNELS, SYSTEM_STATE};

/// Сводка по последним кадрам цикла стабилизации
#[embassy_executor::task]
pub async fn task() {
    let receiver = CHANNELS.diagnostics.receiver();

    let mut elapsed: HistoryBuffer<u32, DIAGNOSTICS_REPORT_FRAMES> = HistoryBuffer::new();
    let mut peak_output = [0u16; 3];
    let mut frames: usize = 0;

    loop {
        let frame = receiver.receive().await;

        if cfg!(feature = "debug-pid") {
            for axis in Axis::ALL {
                let terms = &frame.output.breakdown[axis.index()];
                defmt::debug!(
                    "{}: sp={} P={} I={} D={} -> {}",
                    axis,
                    terms.setpoint,
                    terms.p,
                    terms.i,
                    terms.d,
                    frame.output.get(axis)
                );
            }
        }

        elapsed.write(frame.elapsed_us);
        frames += 1;
        for axis in Axis::ALL {
            let magnitude = frame.output.get(axis).unsigned_abs();
            let peak = &mut peak_output[axis.index()];
            *peak = (*peak).max(magnitude);
        }

        if frames == DIAGNOSTICS_REPORT_FRAMES {
            let total: u32 = elapsed.as_slice().iter().sum();
            let worst = elapsed.as_slice().iter().copied().max().unwrap_or(0);

            defmt::info!(
                "Такт: среднее {} мкс, максимум {} мкс, перегрузок {}",
                total / elapsed.len() as u32,
                worst,
                SYSTEM_STATE.overruns.load(Ordering::Relaxed)
            );
            defmt::info!(
                "Пик поправок: крен {} тангаж {} рыскание {}",
                peak_output[Axis::Roll.index()],
                peak_output[Axis::Pitch.index()],
                peak_output[Axis::Yaw.index()]
            );

            peak_output = [0; 3];
            frames = 0;
        }
    }
}
