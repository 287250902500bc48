//! Component A: the pattern grammar & parser (spec §4.1). Parses one
//! line-oriented UTF-8 configuration file into an ordered list of
//! compiled [`Rule`]s and [`DeviceBinding`]s.
//!
//! Grounded on `event.rs`'s preference for direct, hand-rolled
//! parsing of its own wire format rather than a grammar-combinator
//! dependency: this grammar is small and line-oriented, so a plain
//! line scanner reads the same way the template reads its own raw
//! `input_event` framing.

use crate::error::ConfigError;
use crate::keynames;
use crate::model::{ActionFilter, Button, DeviceBinding, EventCodeSpec, LoadedConfig, PatternElement, Rule};
use std::time::Duration;

/// Parse a configuration file from disk.
pub fn load_file(path: &str) -> Result<LoadedConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })?;
    load_str(path, &text)
}

/// Parse configuration text already in memory, attributing errors to
/// `path` for diagnostics. No reordering is performed: rules are kept
/// in declaration order (§4.1).
pub fn load_str(path: &str, text: &str) -> Result<LoadedConfig, ConfigError> {
    let mut rules = Vec::new();
    let mut bindings = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = (idx + 1) as u32;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("dev:") {
            bindings.push(parse_device_line(path, line_no, rest)?);
        } else {
            rules.push(parse_rule_line(path, line_no, trimmed)?);
        }
    }

    check_no_duplicate_rules(path, &rules)?;

    Ok(LoadedConfig { rules, bindings })
}

fn check_no_duplicate_rules(path: &str, rules: &[Rule]) -> Result<(), ConfigError> {
    for i in 1..rules.len() {
        for j in 0..i {
            if rules[i].sequence == rules[j].sequence
                && rules[i].time_limit == rules[j].time_limit
                && rules[i].command == rules[j].command
            {
                return Err(ConfigError::semantic(
                    path,
                    rules[i].source_line,
                    format!(
                        "duplicate of rule at line {} (identical pattern, time limit, and command)",
                        rules[j].source_line
                    ),
                ));
            }
        }
    }
    Ok(())
}

// --- Device lines ---------------------------------------------------

fn parse_device_line(path: &str, line_no: u32, rest: &str) -> Result<DeviceBinding, ConfigError> {
    let mut rest = strip_comment(rest).trim();

    let shared = if let Some(stripped) = rest.strip_suffix("[shared]") {
        rest = stripped.trim_end();
        true
    } else {
        false
    };

    if rest.is_empty() {
        return Err(ConfigError::syntax(path, line_no, "device line missing a path"));
    }

    let (dev_path, codes_str) = match rest.find(char::is_whitespace) {
        Some(idx) => (&rest[..idx], rest[idx..].trim()),
        None => (rest, ""),
    };
    if dev_path.is_empty() {
        return Err(ConfigError::syntax(path, line_no, "device line missing a path"));
    }

    let mut codes = Vec::new();
    if !codes_str.is_empty() {
        for token in codes_str.split(',') {
            let token = token.trim();
            if token.is_empty() {
                return Err(ConfigError::syntax(path, line_no, "empty event code spec"));
            }
            codes.push(parse_code_spec(path, line_no, token)?);
        }
    }

    Ok(DeviceBinding {
        path: dev_path.to_string(),
        codes,
        shared,
    })
}

fn parse_code_spec(path: &str, line_no: u32, token: &str) -> Result<EventCodeSpec, ConfigError> {
    if let Some(slash) = token.find('/') {
        let type_part = token[..slash].trim();
        let rest = &token[slash + 1..];
        let eq = rest.find('=').ok_or_else(|| {
            ConfigError::syntax(path, line_no, format!("malformed event code spec '{token}': expected type/code=value"))
        })?;
        let code_part = rest[..eq].trim();
        let value_part = rest[eq + 1..].trim();

        let ev_type = resolve_ev_type(path, line_no, type_part)?;
        let code = resolve_code(path, line_no, code_part)?;
        let value: i32 = value_part.parse().map_err(|_| {
            ConfigError::syntax(path, line_no, format!("malformed event code value '{value_part}'"))
        })?;
        Ok(EventCodeSpec {
            ev_type,
            code,
            value: Some(value),
        })
    } else {
        let code = resolve_code(path, line_no, token)?;
        Ok(EventCodeSpec {
            ev_type: input_linux_sys::EV_KEY as u16,
            code,
            value: None,
        })
    }
}

fn resolve_ev_type(path: &str, line_no: u32, text: &str) -> Result<u16, ConfigError> {
    if let Some(code) = keynames::resolve_ev_type(text) {
        return Ok(code);
    }
    text.parse::<u16>()
        .map_err(|_| ConfigError::syntax(path, line_no, format!("unknown event type '{text}'")))
}

fn resolve_code(path: &str, line_no: u32, text: &str) -> Result<u16, ConfigError> {
    if let Some(code) = keynames::resolve_code_name(text) {
        return Ok(code);
    }
    text.parse::<u16>()
        .map_err(|_| ConfigError::syntax(path, line_no, format!("unknown event code '{text}'")))
}

// --- Rule lines -------------------------------------------------------

fn parse_rule_line(path: &str, line_no: u32, trimmed: &str) -> Result<Rule, ConfigError> {
    let colon = trimmed
        .find(':')
        .ok_or_else(|| ConfigError::syntax(path, line_no, "missing ':' separating pattern from command"))?;

    let pattern_raw = &trimmed[..colon];
    // Commands are passed verbatim: a trailing inline comment is not
    // stripped here, unlike the pattern portion above.
    let command = trimmed[colon + 1..].trim().to_string();

    let pattern = strip_comment(pattern_raw).trim();
    if pattern.is_empty() {
        return Err(ConfigError::syntax(path, line_no, "empty pattern"));
    }

    let (seq_str, time_limit) = match pattern.find('<') {
        Some(lt) => {
            let seq_str = pattern[..lt].trim();
            let time_str = pattern[lt + 1..].trim();
            let secs: f64 = time_str.parse().map_err(|_| {
                ConfigError::syntax(path, line_no, format!("malformed time limit '{time_str}'"))
            })?;
            if !secs.is_finite() || secs < 0.0 {
                return Err(ConfigError::syntax(path, line_no, format!("malformed time limit '{time_str}'")));
            }
            (seq_str, Some(Duration::from_secs_f64(secs)))
        }
        None => (pattern, None),
    };

    if seq_str.is_empty() {
        return Err(ConfigError::syntax(path, line_no, "empty pattern"));
    }

    let sequence = parse_pattern_tokens(path, line_no, seq_str)?;

    Ok(Rule {
        sequence,
        time_limit,
        command,
        source_line: line_no,
    })
}

/// Strip a `#`-to-end-of-line comment. There is no quoting mechanism
/// in this grammar, so the first `#` always ends the scanned portion.
fn strip_comment(s: &str) -> &str {
    match s.find('#') {
        Some(idx) => &s[..idx],
        None => s,
    }
}

enum Token {
    Bare(Button),
    Down(Button),
    Up(Button),
}

fn parse_pattern_tokens(path: &str, line_no: u32, seq_str: &str) -> Result<Vec<PatternElement>, ConfigError> {
    let raw_tokens: Vec<&str> = seq_str.split(',').map(str::trim).collect();
    for t in &raw_tokens {
        if t.is_empty() {
            return Err(ConfigError::syntax(path, line_no, "empty pattern token"));
        }
    }

    if raw_tokens.len() == 1 {
        return match classify_token(path, line_no, raw_tokens[0])? {
            Token::Bare(n) => Ok(vec![
                PatternElement {
                    button: n,
                    action_filter: ActionFilter::DownOnly,
                    max_use: Some(0),
                },
                PatternElement {
                    button: n,
                    action_filter: ActionFilter::UpOnly,
                    max_use: Some(0),
                },
            ]),
            Token::Down(n) => Ok(vec![PatternElement {
                button: n,
                action_filter: ActionFilter::DownOnly,
                max_use: None,
            }]),
            Token::Up(n) => Ok(vec![PatternElement {
                button: n,
                action_filter: ActionFilter::UpOnly,
                max_use: None,
            }]),
        };
    }

    raw_tokens
        .into_iter()
        .map(|t| {
            Ok(match classify_token(path, line_no, t)? {
                Token::Bare(n) => PatternElement {
                    button: n,
                    action_filter: ActionFilter::Any,
                    max_use: None,
                },
                Token::Down(n) => PatternElement {
                    button: n,
                    action_filter: ActionFilter::DownOnly,
                    max_use: None,
                },
                Token::Up(n) => PatternElement {
                    button: n,
                    action_filter: ActionFilter::UpOnly,
                    max_use: None,
                },
            })
        })
        .collect()
}

fn classify_token(path: &str, line_no: u32, token: &str) -> Result<Token, ConfigError> {
    if let Some(digits) = token.strip_suffix('v') {
        Ok(Token::Down(parse_button(path, line_no, digits)?))
    } else if let Some(digits) = token.strip_suffix('^') {
        Ok(Token::Up(parse_button(path, line_no, digits)?))
    } else {
        Ok(Token::Bare(parse_button(path, line_no, token)?))
    }
}

fn parse_button(path: &str, line_no: u32, digits: &str) -> Result<Button, ConfigError> {
    let n: i64 = digits
        .parse()
        .map_err(|_| ConfigError::syntax(path, line_no, format!("unknown token shape '{digits}'")))?;
    if n <= 0 {
        return Err(ConfigError::semantic(path, line_no, format!("button number must be positive, got {n}")));
    }
    Ok(n as Button)
}

// --- Canonicalization / pretty-printing (spec §8 property 6) --------

/// Pretty-print a compiled config back to source text. Re-parsing the
/// result must yield the same compiled rule list (property 6).
pub fn pretty_print(config: &LoadedConfig) -> String {
    let mut out = String::new();
    for binding in &config.bindings {
        out.push_str("dev: ");
        out.push_str(&binding.path);
        if !binding.codes.is_empty() {
            out.push(' ');
            let codes: Vec<String> = binding.codes.iter().map(format_code_spec).collect();
            out.push_str(&codes.join(", "));
        }
        if binding.shared {
            out.push_str(" [shared]");
        }
        out.push('\n');
    }
    for rule in &config.rules {
        out.push_str(&format_pattern(&rule.sequence));
        if let Some(limit) = rule.time_limit {
            out.push_str(&format!(" < {}", limit.as_secs_f64()));
        }
        out.push_str(" : ");
        out.push_str(&rule.command);
        out.push('\n');
    }
    out
}

fn format_code_spec(spec: &EventCodeSpec) -> String {
    match spec.value {
        None if spec.ev_type == input_linux_sys::EV_KEY as u16 => spec.code.to_string(),
        Some(v) => format!("{}/{}={}", spec.ev_type, spec.code, v),
        None => format!("{}/{}=0", spec.ev_type, spec.code),
    }
}

fn format_pattern(sequence: &[PatternElement]) -> String {
    if sequence.len() == 2
        && sequence[0].button == sequence[1].button
        && sequence[0].action_filter == ActionFilter::DownOnly
        && sequence[0].max_use == Some(0)
        && sequence[1].action_filter == ActionFilter::UpOnly
        && sequence[1].max_use == Some(0)
    {
        return sequence[0].button.to_string();
    }
    sequence
        .iter()
        .map(|e| match e.action_filter {
            ActionFilter::DownOnly => format!("{}v", e.button),
            ActionFilter::UpOnly => format!("{}^", e.button),
            ActionFilter::Any => e.button.to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ActionFilter::*;

    #[test]
    fn bare_whole_pattern_desugars_with_max_use_zero() {
        let cfg = load_str("t", "1: C\n").unwrap();
        assert_eq!(cfg.rules.len(), 1);
        let seq = &cfg.rules[0].sequence;
        assert_eq!(seq.len(), 2);
        assert_eq!(seq[0], PatternElement { button: 1, action_filter: DownOnly, max_use: Some(0) });
        assert_eq!(seq[1], PatternElement { button: 1, action_filter: UpOnly, max_use: Some(0) });
        assert_eq!(cfg.rules[0].command, "C");
    }

    #[test]
    fn bare_middle_token_is_any_uncapped() {
        let cfg = load_str("t", "1v,2: A\n").unwrap();
        let seq = &cfg.rules[0].sequence;
        assert_eq!(seq.len(), 2);
        assert_eq!(seq[0], PatternElement { button: 1, action_filter: DownOnly, max_use: None });
        assert_eq!(seq[1], PatternElement { button: 2, action_filter: Any, max_use: None });
    }

    #[test]
    fn explicit_down_and_up_tokens() {
        let cfg = load_str("t", "1v,1^: D\n").unwrap();
        let seq = &cfg.rules[0].sequence;
        assert_eq!(seq[0].action_filter, DownOnly);
        assert_eq!(seq[1].action_filter, UpOnly);
        assert_eq!(seq[0].max_use, None);
        assert_eq!(seq[1].max_use, None);
    }

    #[test]
    fn time_limit_parses_seconds() {
        let cfg = load_str("t", "1v,2 < 0.100: FAST\n").unwrap();
        assert_eq!(cfg.rules[0].time_limit, Some(Duration::from_secs_f64(0.100)));
    }

    #[test]
    fn comment_and_blank_lines_are_ignored() {
        let cfg = load_str("t", "# full comment\n\n   \n1: C\n").unwrap();
        assert_eq!(cfg.rules.len(), 1);
    }

    #[test]
    fn trailing_comment_not_stripped_from_command() {
        let cfg = load_str("t", "1: echo hi # not a comment\n").unwrap();
        assert_eq!(cfg.rules[0].command, "echo hi # not a comment");
    }

    #[test]
    fn device_line_parses_codes_and_shared() {
        let cfg = load_str("t", "dev: /dev/input/event3 KEY_A, BTN_LEFT [shared]\n").unwrap();
        assert_eq!(cfg.bindings.len(), 1);
        let b = &cfg.bindings[0];
        assert_eq!(b.path, "/dev/input/event3");
        assert!(b.shared);
        assert_eq!(b.codes.len(), 2);
        assert_eq!(b.codes[0].code, 30);
        assert_eq!(b.codes[1].code, 0x110);
    }

    #[test]
    fn device_line_explicit_rel_spec() {
        let cfg = load_str("t", "dev: /dev/input/mouse0 EV_REL/REL_WHEEL=1\n").unwrap();
        let spec = cfg.bindings[0].codes[0];
        assert_eq!(spec.ev_type, input_linux_sys::EV_REL as u16);
        assert_eq!(spec.code, 8);
        assert_eq!(spec.value, Some(1));
        assert!(spec.is_auto_release());
    }

    #[test]
    fn missing_colon_is_syntax_error() {
        let err = load_str("t", "1v,2 FAST\n").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { .. }));
    }

    #[test]
    fn zero_button_is_semantic_error() {
        let err = load_str("t", "0: C\n").unwrap_err();
        assert!(matches!(err, ConfigError::Semantic { .. }));
    }

    #[test]
    fn duplicate_rule_is_rejected() {
        let err = load_str("t", "1: C\n1: C\n").unwrap_err();
        assert!(matches!(err, ConfigError::Semantic { .. }));
    }

    #[test]
    fn empty_pattern_is_syntax_error() {
        let err = load_str("t", " : C\n").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { .. }));
    }

    #[test]
    fn round_trip_pretty_print_reparses_identically() {
        let src = "dev: /dev/input/event3 KEY_A, BTN_LEFT [shared]\n\
                   1v,2: A\n\
                   1v,3: B\n\
                   1: C\n\
                   1v,1^: D\n\
                   1,2,3 < 0.5: SLOW\n";
        let cfg = load_str("t", src).unwrap();
        let printed = pretty_print(&cfg);
        let reparsed = load_str("t2", &printed).unwrap();
        assert_eq!(cfg.bindings.len(), reparsed.bindings.len());
        for (a, b) in cfg.bindings.iter().zip(reparsed.bindings.iter()) {
            assert_eq!(a.path, b.path);
            assert_eq!(a.shared, b.shared);
            assert_eq!(a.codes, b.codes);
        }
        assert_eq!(cfg.rules.len(), reparsed.rules.len());
        for (a, b) in cfg.rules.iter().zip(reparsed.rules.iter()) {
            assert_eq!(a.sequence, b.sequence);
            assert_eq!(a.time_limit, b.time_limit);
            assert_eq!(a.command, b.command);
        }
    }
}
