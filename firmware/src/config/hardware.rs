//! Конфигурация аппаратного обеспечения стабилизатора

/// Helper macro to create interrupt executors.
macro_rules! interrupt_executor {
    ($interrupt:ident, $prio:ident) => {{
        use embassy_executor::InterruptExecutor;
        use embassy_rp::interrupt;
        use embassy_rp::interrupt::{InterruptExt, Priority};

        interrupt::$interrupt.set_priority(Priority::$prio);
        static EXECUTOR: InterruptExecutor = InterruptExecutor::new();
        let spawner = EXECUTOR.start(interrupt::$interrupt);

        #[interrupt]
        #[allow(non_snake_case)]
        unsafe fn $interrupt() {
            EXECUTOR.on_interrupt()
        }

        spawner
    }};
}

pub(crate) use interrupt_executor;

/// Параметры системы
pub mod system {
    /// Период цикла стабилизации (мкс), 1 кГц
    pub const CONTROL_LOOPTIME_US: u32 = 1000;

    /// Каждый N-й такт отправляется в задачу диагностики
    pub const DIAGNOSTICS_DECIMATION: u32 = 10;

    /// Кадров диагностики между сводками в лог (~1 с)
    pub const DIAGNOSTICS_REPORT_FRAMES: usize = 100;

    /// Минимальная системная частота для цикла 1 кГц без FPU (Гц)
    pub const MIN_SYS_FREQ_HZ: u32 = 100_000_000;

    /// Период мигания светодиода в основном цикле (мс)
    pub const HEARTBEAT_MS: u64 = 500;
}
