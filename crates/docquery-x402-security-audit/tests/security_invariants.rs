//! Security invariant tests for the docquery x402 client.
//!
//! These tests verify that critical security properties hold across the codebase.
//! They run on every `cargo test --workspace` invocation, ensuring that future
//! changes don't accidentally regress security posture.

use regex::Regex;
use std::path::Path;
use walkdir::WalkDir;

/// Read all .rs source files from production crates (excluding tests and this crate).
fn production_source_files() -> Vec<(String, String)> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap();

    let crates_dir = root.join("crates");
    let mut files = Vec::new();

    for entry in WalkDir::new(&crates_dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();

        // Only .rs files
        if path.extension().and_then(|e| e.to_str()) != Some("rs") {
            continue;
        }

        // Skip this crate itself
        if path
            .to_str()
            .map(|s| s.contains("security-audit"))
            .unwrap_or(false)
        {
            continue;
        }

        // Skip test directories and test files
        let path_str = path.to_str().unwrap_or("");
        if path_str.contains("tests/") || path_str.contains("\\tests\\") {
            continue;
        }

        if let Ok(content) = std::fs::read_to_string(path) {
            files.push((path_str.to_string(), content));
        }
    }

    files
}

/// Filter to only lines outside of `#[cfg(test)]` modules and `mod tests` blocks.
/// This is a heuristic: it removes everything after `#[cfg(test)]` in a file.
fn production_lines(content: &str) -> String {
    let mut result = Vec::new();
    let mut in_test_module = false;

    for line in content.lines() {
        if line.contains("#[cfg(test)]") || line.trim().starts_with("mod tests") {
            in_test_module = true;
        }
        if !in_test_module {
            result.push(line);
        }
    }

    result.join("\n")
}

/// Production lines with comments and doc examples dropped.
fn code_lines(content: &str) -> Vec<(usize, String)> {
    production_lines(content)
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim_start().starts_with("//"))
        .map(|(i, line)| (i + 1, line.to_string()))
        .collect()
}

fn file_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
}

#[test]
fn production_sources_are_found() {
    let files = production_source_files();
    for expected in ["eip712.rs", "query_client.rs", "config.rs"] {
        assert!(
            files.iter().any(|(path, _)| file_name(path) == expected),
            "expected to scan {expected}; the crate layout changed"
        );
    }
}

#[test]
fn no_hardcoded_private_keys_in_production_code() {
    let hex_64_re = Regex::new(r"0x[a-fA-F0-9]{64}").unwrap();
    let files = production_source_files();

    for (path, content) in &files {
        let prod_content = production_lines(content);

        for mat in hex_64_re.find_iter(&prod_content) {
            let line_num = prod_content[..mat.start()].lines().count() + 1;
            let line = prod_content.lines().nth(line_num - 1).unwrap_or("");
            panic!(
                "Potential hardcoded secret found at {}:{}: {}",
                path,
                line_num,
                line.trim()
            );
        }
    }
}

#[test]
fn http_clients_disable_redirects() {
    let files = production_source_files();
    let builder_re = Regex::new(r"reqwest::Client::builder\(\)").unwrap();
    let redirect_re = Regex::new(r"redirect\s*\(\s*.*Policy::none\(\)").unwrap();

    for (path, content) in &files {
        let prod_content = production_lines(content);

        for mat in builder_re.find_iter(&prod_content) {
            // Look in the next ~500 chars for .build()
            let search_end = (mat.end() + 500).min(prod_content.len());
            let builder_chain = &prod_content[mat.start()..search_end];

            assert!(
                redirect_re.is_match(builder_chain),
                "reqwest::Client::builder() at {} does not set redirect(Policy::none()). \
                 A redirect would replay the X-PAYMENT and x-api-key headers to another host.",
                path
            );
        }
    }
}

#[test]
fn http_clients_set_a_timeout() {
    let files = production_source_files();

    for (path, content) in &files {
        let prod_content = production_lines(content);
        if let Some(start) = prod_content.find("reqwest::Client::builder()") {
            let end = (start + 500).min(prod_content.len());
            assert!(
                prod_content[start..end].contains(".timeout("),
                "reqwest::Client::builder() at {} does not set a request timeout.",
                path
            );
        }
    }
}

#[test]
fn amounts_never_touch_floating_point() {
    let float_re = Regex::new(r"\b(f32|f64)\b|as_f64\(").unwrap();
    let money_files = [
        "eip712.rs",
        "payment.rs",
        "money.rs",
        "response.rs",
        "scheme_client.rs",
        "query_client.rs",
    ];

    for (path, content) in &production_source_files() {
        if !money_files.contains(&file_name(path)) {
            continue;
        }
        for (line_num, line) in code_lines(content) {
            assert!(
                !float_re.is_match(&line),
                "Floating point in amount handling at {}:{}: {}. \
                 Amounts must stay decimal strings or integers.",
                path,
                line_num,
                line.trim()
            );
        }
    }
}

#[test]
fn environment_is_read_only_by_config() {
    let env_re = Regex::new(r"env::var(_os)?\s*\(").unwrap();

    for (path, content) in &production_source_files() {
        if file_name(path) == "config.rs" {
            continue;
        }
        for (line_num, line) in code_lines(content) {
            assert!(
                !env_re.is_match(&line),
                "Environment read at {}:{}: {}. \
                 Configuration must be passed explicitly via ClientConfig.",
                path,
                line_num,
                line.trim()
            );
        }
    }
}

#[test]
fn signing_keys_are_not_debug_printed() {
    let field_re = Regex::new(r"\w+\s*:\s*(Option<)?PrivateKeySigner").unwrap();
    let derive_re = Regex::new(r"#\[derive\([^)]*\bDebug\b").unwrap();

    for (path, content) in &production_source_files() {
        let prod_content = production_lines(content);
        let lines: Vec<&str> = prod_content.lines().collect();

        for (i, line) in lines.iter().enumerate() {
            if !field_re.is_match(line) || line.trim_start().starts_with("//") {
                continue;
            }
            // Walk back to the owning struct and its attributes.
            let struct_idx = (0..i).rev().find(|&j| lines[j].contains("struct "));
            let Some(struct_idx) = struct_idx else {
                continue;
            };
            let attr_start = struct_idx.saturating_sub(4);
            let attrs = lines[attr_start..struct_idx].join("\n");
            assert!(
                !derive_re.is_match(&attrs),
                "Struct holding a PrivateKeySigner at {}:{} derives Debug. \
                 Implement Debug by hand and redact the key.",
                path,
                struct_idx + 1
            );
        }
    }
}

#[test]
fn api_key_header_is_marked_sensitive() {
    for (path, content) in &production_source_files() {
        let prod_content = production_lines(content);
        if !prod_content.contains("API_KEY_HEADER") || file_name(path) == "constants.rs" {
            continue;
        }
        assert!(
            prod_content.contains("set_sensitive(true)"),
            "{} sends the API key header without marking it sensitive.",
            path
        );
    }
}

#[test]
fn production_code_does_not_panic_on_input() {
    let panic_re = Regex::new(r"\.unwrap\(\)|\.expect\(|\bpanic!\(").unwrap();

    for (path, content) in &production_source_files() {
        // The binary owns its process and may exit however it likes.
        if file_name(path) == "main.rs" {
            continue;
        }
        for (line_num, line) in code_lines(content) {
            assert!(
                !panic_re.is_match(&line),
                "Possible panic at {}:{}: {}. Propagate the error instead.",
                path,
                line_num,
                line.trim()
            );
        }
    }
}
