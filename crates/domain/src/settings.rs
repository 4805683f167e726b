//! Store-wide settings the payment core consults.

/// Configuration knobs that shape cart arithmetic and key generation.
///
/// Plain data with sensible defaults; callers construct one per store and
/// hand it to the service.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Nominal currency code carried on new payments.
    pub currency: String,

    /// Whether the store charges tax at all. Affects the subtotal
    /// fallback during hydration.
    pub use_taxes: bool,

    /// When true, catalog prices already include tax and the line tax is
    /// subtracted from the line subtotal at add time.
    pub prices_include_tax: bool,

    /// When false, every cart line is forced to quantity 1.
    pub item_quantities_enabled: bool,

    /// Whether new payments are recorded in test mode.
    pub test_mode: bool,

    /// Per-install secret mixed into generated purchase keys.
    pub install_key: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            use_taxes: true,
            prices_include_tax: false,
            item_quantities_enabled: false,
            test_mode: false,
            install_key: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let settings = StoreSettings::default();
        assert_eq!(settings.currency, "USD");
        assert!(settings.use_taxes);
        assert!(!settings.prices_include_tax);
        assert!(!settings.item_quantities_enabled);
        assert!(!settings.test_mode);
    }
}
