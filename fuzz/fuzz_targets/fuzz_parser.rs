#![no_main]

use libfuzzer_sys::fuzz_target;
use pedal_macro::parser;

// The primary goal of fuzzing the parser is finding panics, hangs, or
// memory issues on malformed input, not reaching any particular
// result -- `load_str` returning `Err` is a perfectly fine outcome.
fuzz_target!(|data: &str| {
    let _ = parser::load_str("<fuzz>", data);
});
