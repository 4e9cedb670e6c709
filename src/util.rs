//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Remove a surrounding markdown code fence (```json ... ```) if the model added one.
pub fn strip_code_fences(s: &str) -> &str {
  let t = s.trim();
  let Some(rest) = t.strip_prefix("```") else { return t };
  // Skip the info string ("json") up to the first newline.
  let body = match rest.find('\n') {
    Some(nl) => &rest[nl + 1..],
    None => rest,
  };
  body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) { cut -= 1; }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn template_replaces_known_keys_only() {
    let out = fill_template("{count} on {topic} {\"x\": 1}", &[("count", "5"), ("topic", "Civil Engineering")]);
    assert_eq!(out, "5 on Civil Engineering {\"x\": 1}");
  }

  #[test]
  fn fences_are_stripped() {
    assert_eq!(strip_code_fences("```json\n[1, 2]\n```"), "[1, 2]");
    assert_eq!(strip_code_fences("```\n{}\n```\n"), "{}");
    assert_eq!(strip_code_fences("  [1]  "), "[1]");
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    let s = "ééééé";
    let out = trunc_for_log(s, 3);
    assert!(out.starts_with('é'));
    assert!(out.ends_with("(10 bytes total)"));
    assert_eq!(trunc_for_log("short", 10), "short");
  }
}
