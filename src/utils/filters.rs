//! Цифровые фильтры для D-составляющей и P-составляющей рыскания

use core::f32::consts::PI;

use crate::config::profile::{DtermFilterType, TunableProfile};

/// Добротность фильтра Баттерворта второго порядка
const BUTTERWORTH_Q: f32 = core::f32::consts::FRAC_1_SQRT_2;

/// Коэффициент однополюсного фильтра: alpha = dt / (RC + dt), где RC = 1 / (2 * pi * fc)
#[inline]
fn pt1_gain(cutoff_freq_hz: f32, dt: f32) -> f32 {
    let rc = 1.0 / (2.0 * PI * cutoff_freq_hz);
    (dt / (rc + dt)).clamp(0.0, 1.0)
}

/// Фильтр нижних частот первого порядка (RC-фильтр)
#[derive(Debug, Clone, PartialEq)]
pub struct Pt1Filter {
    /// Коэффициент фильтра (0.0-1.0)
    alpha: f32,
    /// Текущее выходное значение
    state: f32,
}

impl Pt1Filter {
    /// Создание нового фильтра
    ///
    /// # Параметры
    /// * `cutoff_freq_hz` - частота среза в Гц
    /// * `dt` - период дискретизации в секундах
    pub fn new(cutoff_freq_hz: f32, dt: f32) -> Self {
        Self {
            alpha: pt1_gain(cutoff_freq_hz, dt),
            state: 0.0,
        }
    }

    /// Фильтрация одного значения: y[n] = y[n-1] + α * (x[n] - y[n-1])
    #[inline]
    pub fn apply(&mut self, input: f32) -> f32 {
        self.state += self.alpha * (input - self.state);
        self.state
    }
}

/// Биквадратный фильтр (прямая форма I)
#[derive(Debug, Clone, PartialEq)]
pub struct BiquadFilter {
    /// Коэффициенты, нормированные на a0
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    /// Предыдущие входные значения
    x1: f32,
    x2: f32,
    /// Предыдущие выходные значения
    y1: f32,
    y2: f32,
}

impl BiquadFilter {
    /// Фильтр нижних частот Баттерворта
    pub fn lowpass(cutoff_freq_hz: f32, dt: f32) -> Self {
        let (sin_omega, cos_omega) = Self::omega(cutoff_freq_hz, dt);
        let alpha = sin_omega / (2.0 * BUTTERWORTH_Q);

        let b0 = (1.0 - cos_omega) / 2.0;
        Self::normalized(b0, 1.0 - cos_omega, b0, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
    }

    /// Режекторный фильтр с центром `center_freq_hz` и добротностью `q`
    pub fn notch(center_freq_hz: f32, q: f32, dt: f32) -> Self {
        let (sin_omega, cos_omega) = Self::omega(center_freq_hz, dt);
        let alpha = sin_omega / (2.0 * q);

        Self::normalized(1.0, -2.0 * cos_omega, 1.0, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
    }

    fn omega(freq_hz: f32, dt: f32) -> (f32, f32) {
        let omega = 2.0 * PI * freq_hz * dt;
        (libm::sinf(omega), libm::cosf(omega))
    }

    fn normalized(b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) -> Self {
        let a0_inv = 1.0 / a0;
        Self {
            b0: b0 * a0_inv,
            b1: b1 * a0_inv,
            b2: b2 * a0_inv,
            a1: a1 * a0_inv,
            a2: a2 * a0_inv,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Фильтрация одного значения
    #[inline]
    pub fn apply(&mut self, input: f32) -> f32 {
        // y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        // Сдвиг истории
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// Добротность режекторного фильтра по центру и нижней границе полосы
pub fn notch_q(center_freq_hz: f32, cutoff_freq_hz: f32) -> f32 {
    center_freq_hz * cutoff_freq_hz / (center_freq_hz * center_freq_hz - cutoff_freq_hz * cutoff_freq_hz)
}

/// Параметры профиля, от которых зависит цепочка фильтров D
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DtermFilterSettings {
    pub lpf_hz: u16,
    pub lpf_type: DtermFilterType,
    pub notch_hz: u16,
    pub notch_cutoff_hz: u16,
}

impl DtermFilterSettings {
    pub fn from_profile(profile: &TunableProfile) -> Self {
        Self {
            lpf_hz: profile.dterm_lpf_hz,
            lpf_type: profile.dterm_filter_type,
            notch_hz: profile.dterm_notch_hz,
            notch_cutoff_hz: profile.dterm_notch_cutoff,
        }
    }
}

/// ФНЧ D-составляющей: однополюсный или биквадратный, но не оба сразу
#[derive(Debug, Clone, PartialEq)]
pub enum DtermLowPass {
    Pt1(Pt1Filter),
    Biquad(BiquadFilter),
}

impl DtermLowPass {
    #[inline]
    fn apply(&mut self, input: f32) -> f32 {
        match self {
            DtermLowPass::Pt1(filter) => filter.apply(input),
            DtermLowPass::Biquad(filter) => filter.apply(input),
        }
    }
}

/// Цепочка фильтров D-составляющей, выбирается при загрузке профиля
#[derive(Debug, Clone, PartialEq)]
pub enum DtermFilterChain {
    None,
    LowPass(DtermLowPass),
    Notch(BiquadFilter),
    NotchLowPass(BiquadFilter, DtermLowPass),
}

impl DtermFilterChain {
    /// Построение цепочки; нулевая частота означает отсутствие звена
    ///
    /// Режекторный фильтр строится только при `0 < cutoff < center`, иначе
    /// добротность вырождается.
    pub fn new(settings: &DtermFilterSettings, dt: f32) -> Self {
        let notch_valid = settings.notch_hz != 0
            && settings.notch_cutoff_hz != 0
            && settings.notch_cutoff_hz < settings.notch_hz;
        let notch = notch_valid.then(|| {
            let center = f32::from(settings.notch_hz);
            let q = notch_q(center, f32::from(settings.notch_cutoff_hz));
            BiquadFilter::notch(center, q, dt)
        });

        let lowpass = (settings.lpf_hz != 0).then(|| {
            let cutoff = f32::from(settings.lpf_hz);
            match settings.lpf_type {
                DtermFilterType::Pt1 => DtermLowPass::Pt1(Pt1Filter::new(cutoff, dt)),
                DtermFilterType::Biquad => DtermLowPass::Biquad(BiquadFilter::lowpass(cutoff, dt)),
            }
        });

        match (notch, lowpass) {
            (None, None) => DtermFilterChain::None,
            (None, Some(lpf)) => DtermFilterChain::LowPass(lpf),
            (Some(notch), None) => DtermFilterChain::Notch(notch),
            (Some(notch), Some(lpf)) => DtermFilterChain::NotchLowPass(notch, lpf),
        }
    }

    /// Фильтрация: сначала режекторный, затем ФНЧ
    #[inline]
    pub fn apply(&mut self, input: f32) -> f32 {
        match self {
            DtermFilterChain::None => input,
            DtermFilterChain::LowPass(lpf) => lpf.apply(input),
            DtermFilterChain::Notch(notch) => notch.apply(input),
            DtermFilterChain::NotchLowPass(notch, lpf) => lpf.apply(notch.apply(input)),
        }
    }
}
