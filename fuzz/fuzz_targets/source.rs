#![no_main]

use assertscope::{config::AnalyzerConfig, AnalysisEngine};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        let _ = AnalysisEngine::with_defaults().fix_all(source, AnalyzerConfig::default());
    }
});
