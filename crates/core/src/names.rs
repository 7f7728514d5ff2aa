use std::collections::HashSet;

/// Returns `base` if unused, otherwise `base2`, `base3`, ... (first free).
pub fn ensure_unique<'a>(base: &str, existing: impl IntoIterator<Item = &'a str>) -> String {
	let taken: HashSet<&str> = existing.into_iter().collect();
	if !taken.contains(base) {
		return base.to_string();
	}
	(2u32..)
		.map(|n| format!("{base}{n}"))
		.find(|candidate| !taken.contains(candidate.as_str()))
		.unwrap_or_else(|| base.to_string())
}
