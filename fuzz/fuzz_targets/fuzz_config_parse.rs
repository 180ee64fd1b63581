#![no_main]

use libfuzzer_sys::fuzz_target;
use rumagent::AgentConfiguration;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(config) = AgentConfiguration::from_toml(text) {
            let _ = config.validate();
            let _ = config.endpoint.to_string();
        }
    }
});
