// src/tasks/control_task.rs
use core::sync::atomic::Ordering;
use embassy_time::{Duration, Instant, Ticker};
use rate_stabilizer::Stabilizer;

use crate::config::hardware::system::{CONTROL_LOOPTIME_US, DIAGNOSTICS_DECIMATION};
use crate::data::{DiagnosticsFrame, CHANNELS, SYSTEM_STATE};

/// Сообщения о перегрузке не чаще раза в N тактов
const OVERRUN_LOG_INTERVAL: u32 = 1000;

#[embassy_executor::task]
pub async fn task() {
    let mut stabilizer = match Stabilizer::new(CONTROL_LOOPTIME_US) {
        Ok(stabilizer) => stabilizer,
        Err(e) => {
            defmt::error!("Стабилизатор не создан: {}", e);
            return;
        }
    };

    let diagnostics_sender = CHANNELS.diagnostics.sender();
    let mut ticker = Ticker::every(Duration::from_micros(u64::from(CONTROL_LOOPTIME_US)));
    let mut tick: u32 = 0;

    defmt::info!("Цикл стабилизации: {} мкс", CONTROL_LOOPTIME_US);

    loop {
        ticker.next().await;
        tick = tick.wrapping_add(1);

        let started = Instant::now();

        // Входы такта читаются один раз, профиль применяется с этого такта
        let profile = SYSTEM_STATE.profile();
        let inputs = SYSTEM_STATE.tick_inputs();
        let output = stabilizer.update(&profile, &inputs);

        CHANNELS.output.signal(output);

        let elapsed_us = started.elapsed().as_micros() as u32;
        if elapsed_us > CONTROL_LOOPTIME_US {
            let overruns = SYSTEM_STATE.overruns.fetch_add(1, Ordering::Relaxed) + 1;
            if overruns % OVERRUN_LOG_INTERVAL == 1 {
                defmt::warn!("Такт {} мкс длиннее периода ({} перегрузок)", elapsed_us, overruns);
            }
        }

        if tick % DIAGNOSTICS_DECIMATION == 0 {
            if diagnostics_sender
                .try_send(DiagnosticsFrame { output, elapsed_us })
                .is_err()
            {
                defmt::trace!("Буфер диагностики переполнен");
            }
        }
    }
}
