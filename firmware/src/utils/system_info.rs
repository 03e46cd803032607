//! Информация о системе и тактировании

use embassy_rp::clocks;

use crate::config::hardware::system::MIN_SYS_FREQ_HZ;

/// Частоты системы
#[derive(Debug, Clone, Copy)]
pub struct SystemClocks {
    pub sys_freq: u32,
    pub peri_freq: u32,
    pub ref_freq: u32,
}

pub fn get_system_clocks() -> SystemClocks {
    SystemClocks {
        sys_freq: clocks::clk_sys_freq(),
        peri_freq: clocks::clk_peri_freq(),
        ref_freq: clocks::clk_ref_freq(),
    }
}

/// Вывести информацию о частотах в лог
pub fn print_clock_info() {
    let clocks = get_system_clocks();

    defmt::info!("=== Конфигурация тактирования ===");
    defmt::info!("Системная частота: {} МГц", clocks.sys_freq / 1_000_000);
    defmt::info!("Периферийная частота: {} МГц", clocks.peri_freq / 1_000_000);
    defmt::info!("Опорная частота: {} МГц", clocks.ref_freq / 1_000_000);
}

/// Проверка, что частоты достаточны для цикла стабилизации
pub fn validate_clocks() -> Result<(), &'static str> {
    let clocks = get_system_clocks();

    // Расчет на f32 идет программно, нужен запас по такту
    if clocks.sys_freq < MIN_SYS_FREQ_HZ {
        return Err("Системная частота слишком низкая для цикла 1 кГц");
    }

    Ok(())
}
