#![no_main]

use libfuzzer_sys::fuzz_target;
use rumagent::config::RemoteConfiguration;
use rumagent::testing::ConfigurationTestBuilder;

fuzz_target!(|data: &[u8]| {
    if let Ok(remote) = RemoteConfiguration::decode(data) {
        let mut config = ConfigurationTestBuilder::build_minimal();
        config.merge_remote(&remote);
        assert!(config.session_timeout() > 0.0);
        assert!(config.max_session_length() > 0.0);
    }
});
