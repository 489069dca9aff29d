//! Country and region inference from node display names.
//!
//! Subscription providers encode location hints in free-form names (flag
//! emoji, ISO abbreviations, native city/country names). The tables below
//! are best-effort: no match leaves the field empty, and a wrong match is
//! acceptable — nothing downstream treats the result as authoritative.

/// Keyword table per country code. First matching entry wins, so more
/// specific markers should come before ambiguous ones within a row.
static COUNTRY_KEYWORDS: &[(&str, &[&str])] = &[
    ("US", &["美国", "USA", "United States", "America", "🇺🇸"]),
    ("HK", &["香港", "Hong Kong", "HK", "🇭🇰", "港"]),
    ("SG", &["新加坡", "Singapore", "SG", "狮城", "🇸🇬"]),
    ("JP", &["日本", "Japan", "JP", "东京", "大阪", "🇯🇵"]),
    ("TW", &["台湾", "Taiwan", "TW", "🇹🇼"]),
    ("KR", &["韩国", "Korea", "KR", "首尔", "🇰🇷"]),
    ("UK", &["英国", "United Kingdom", "UK", "🇬🇧"]),
    ("DE", &["德国", "Germany", "DE", "🇩🇪"]),
    ("FR", &["法国", "France", "FR", "🇫🇷"]),
    ("CA", &["加拿大", "Canada", "CA", "🇨🇦"]),
    ("AU", &["澳大利亚", "Australia", "AU", "🇦🇺"]),
];

/// Coarse geographic buckets, independent of the country table.
static REGION_KEYWORDS: &[(&str, &[&str])] = &[
    ("Asia", &["亚洲", "Asia", "AS"]),
    ("Europe", &["欧洲", "Europe", "EU"]),
    ("North America", &["北美", "North America", "NA"]),
    ("South America", &["南美", "South America", "SA"]),
    ("Africa", &["非洲", "Africa", "AF"]),
    ("Oceania", &["大洋洲", "Oceania", "OC"]),
];

/// Infers an ISO-ish country code from a display name, case-insensitively.
pub fn infer_country(name: &str) -> Option<String> {
    scan(name, COUNTRY_KEYWORDS)
}

/// Infers a coarse region bucket from a display name, case-insensitively.
pub fn infer_region(name: &str) -> Option<String> {
    scan(name, REGION_KEYWORDS)
}

fn scan(name: &str, table: &[(&str, &[&str])]) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let upper = name.to_uppercase();
    for (code, keywords) in table {
        for keyword in *keywords {
            if upper.contains(&keyword.to_uppercase()) {
                return Some((*code).to_string());
            }
        }
    }
    None
}
