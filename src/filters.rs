/// Matches `app.model` labels against exclusion patterns using `*` and `?`.
pub fn glob_match(pattern: &str, text: &str) -> bool {
	let p: Vec<char> = pattern.chars().collect();
	let t: Vec<char> = text.chars().collect();
	let mut dp = vec![vec![false; t.len() + 1]; p.len() + 1];
	dp[0][0] = true;

	for i in 1..=p.len() {
		if p[i - 1] == '*' {
			dp[i][0] = dp[i - 1][0];
		}
	}

	for i in 1..=p.len() {
		for j in 1..=t.len() {
			if p[i - 1] == '*' {
				dp[i][j] = dp[i - 1][j] || dp[i][j - 1];
			} else if p[i - 1] == '?' || p[i - 1] == t[j - 1] {
				dp[i][j] = dp[i - 1][j - 1];
			}
		}
	}

	dp[p.len()][t.len()]
}

#[cfg(test)]
mod tests {
	use super::glob_match;

	#[test]
	fn exact_labels_match_only_themselves() {
		assert!(glob_match("blog.post", "blog.post"));
		assert!(!glob_match("blog.post", "blog.posts"));
		assert!(!glob_match("blog.post", "shop.post"));
	}

	#[test]
	fn wildcards_cover_whole_apps() {
		assert!(glob_match("blog.*", "blog.post"));
		assert!(glob_match("*.comment", "blog.comment"));
		assert!(glob_match("shop.ord?r", "shop.order"));
		assert!(!glob_match("blog.*", "shop.post"));
	}
}
