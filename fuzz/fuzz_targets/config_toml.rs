#![no_main]

use libfuzzer_sys::fuzz_target;
use roompulse_core::config::Config;
use roompulse_core::error::ConfigError;
use roompulse_core::retention::RetentionEngine;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    match Config::from_toml_str(raw) {
        Ok(config) => {
            // Anything that loads must build an engine and survive a re-render.
            assert!(RetentionEngine::new(config.retention).is_ok());
            let rendered = config.to_toml_string().expect("valid config renders");
            let reparsed = Config::from_toml_str(&rendered).expect("rendered config reloads");
            assert_eq!(reparsed.retention, config.retention);
        }
        Err(ConfigError::Invalid { violations }) => {
            assert!(!violations.is_empty());
        }
        Err(_) => {}
    }
});
