/// Доля видимости sentinel-элемента, начиная с которой догружается лента.
pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.1;

/// Наблюдатель за sentinel-элементом в конце ленты.
///
/// Не хранит состояния и не делает debounce: каждое наблюдение выше порога
/// означает «догрузить», а повторы во время запроса гасит контроллер.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentinelObserver {
    threshold: f64,
}

impl SentinelObserver {
    /// Порог вне `(0, 1]` (и NaN) заменяется значением по умолчанию.
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold > 0.0 && threshold <= 1.0 {
            threshold
        } else {
            DEFAULT_VISIBILITY_THRESHOLD
        };
        Self { threshold }
    }

    /// Порог видимости.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Пересекает ли sentinel порог при доле видимости `visible_ratio`.
    pub fn is_intersecting(&self, visible_ratio: f64) -> bool {
        visible_ratio >= self.threshold
    }
}

impl Default for SentinelObserver {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBILITY_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_from_ten_percent_visibility() {
        let sentinel = SentinelObserver::default();
        assert!(!sentinel.is_intersecting(0.0));
        assert!(!sentinel.is_intersecting(0.09));
        assert!(sentinel.is_intersecting(0.1));
        assert!(sentinel.is_intersecting(1.0));
    }

    #[test]
    fn invalid_threshold_falls_back_to_default() {
        assert_eq!(SentinelObserver::new(0.0).threshold(), DEFAULT_VISIBILITY_THRESHOLD);
        assert_eq!(SentinelObserver::new(1.5).threshold(), DEFAULT_VISIBILITY_THRESHOLD);
        assert_eq!(SentinelObserver::new(f64::NAN).threshold(), DEFAULT_VISIBILITY_THRESHOLD);
        assert_eq!(SentinelObserver::new(0.5).threshold(), 0.5);
    }
}
