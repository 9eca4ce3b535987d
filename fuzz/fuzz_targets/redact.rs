#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let input = data.to_vec();
    if let Ok(output) = debugstrip::redact(input) {
        assert_eq!(output.len(), data.len());
    }
});
