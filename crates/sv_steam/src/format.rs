//! Small text helpers for showing Steam data.

use chrono::DateTime;

const ICON_CDN: &str = "https://media.steampowered.com/steamcommunity/public/images/apps";

/// `"0 hours"`, `"45 min"`, `"1,234 hours"`.
#[must_use]
pub fn format_playtime(minutes: u64) -> String {
    if minutes == 0 {
        return "0 hours".to_owned();
    }
    let hours = minutes / 60;
    match hours {
        0 => format!("{minutes} min"),
        1 => "1 hour".to_owned(),
        n => format!("{} hours", group_thousands(n)),
    }
}

/// Steam CDN URL for a game's small icon.
#[must_use]
pub fn game_icon_url(app_id: u32, icon_hash: Option<&str>) -> Option<String> {
    let hash = icon_hash.filter(|h| !h.is_empty())?;
    Some(format!("{ICON_CDN}/{app_id}/{hash}.jpg"))
}

/// `dd/mm/yyyy` in UTC, or an empty string for no timestamp.
#[must_use]
pub fn format_unlock_date(timestamp: Option<i64>) -> String {
    timestamp
        .filter(|t| *t > 0)
        .and_then(|t| DateTime::from_timestamp(t, 0))
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playtime() {
        assert_eq!(format_playtime(0), "0 hours");
        assert_eq!(format_playtime(45), "45 min");
        assert_eq!(format_playtime(61), "1 hour");
        assert_eq!(format_playtime(150), "2 hours");
        assert_eq!(format_playtime(1234 * 60 + 5), "1,234 hours");
        assert_eq!(format_playtime(1_000_000 * 60), "1,000,000 hours");
    }

    #[test]
    fn icon_url() {
        assert_eq!(
            game_icon_url(440, Some("e3f595a92552da3d664ad00277fad2107345f743")).as_deref(),
            Some("https://media.steampowered.com/steamcommunity/public/images/apps/440/e3f595a92552da3d664ad00277fad2107345f743.jpg")
        );
        assert_eq!(game_icon_url(440, Some("")), None);
        assert_eq!(game_icon_url(440, None), None);
    }

    #[test]
    fn unlock_date() {
        assert_eq!(format_unlock_date(Some(1_700_000_000)), "14/11/2023");
        assert_eq!(format_unlock_date(Some(0)), "");
        assert_eq!(format_unlock_date(None), "");
    }
}
