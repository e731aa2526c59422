use teloxide::utils::html;

/// HTML mention used in group notices.
///
/// Prefers `@username`, falls back to the full name; the numeric id is always
/// appended in a code span so admins can act on it.
pub fn format_user_label(
    user_id: u64,
    username: Option<&str>,
    first_name: &str,
    last_name: Option<&str>,
) -> String {
    let name = match username.map(str::trim).filter(|name| !name.is_empty()) {
        Some(username) => format!("@{}", html::escape(username)),
        None => html::escape(&full_name(first_name, last_name)),
    };

    format!("{name} [<code>{user_id}</code>]")
}

pub fn full_name(first_name: &str, last_name: Option<&str>) -> String {
    match last_name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(last_name) => format!("{} {}", first_name.trim(), last_name),
        None => first_name.trim().to_owned(),
    }
}

/// `count/threshold`, e.g. `2/3`.
pub fn format_warning_progress(count: u32, threshold: u32) -> String {
    format!("{count}/{threshold}")
}

/// Button label with a check mark when the option is the active one.
pub fn option_label(label: &str, selected: bool) -> String {
    if selected {
        format!("{label} ✅")
    } else {
        label.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::{format_user_label, format_warning_progress, full_name, option_label};

    #[test]
    fn user_label_prefers_username() {
        assert_eq!(
            format_user_label(42, Some("alice"), "Alice", Some("Smith")),
            "@alice [<code>42</code>]"
        );
    }

    #[test]
    fn user_label_falls_back_to_full_name() {
        assert_eq!(
            format_user_label(7, None, "Bob", Some("Stone")),
            "Bob Stone [<code>7</code>]"
        );
        assert_eq!(
            format_user_label(7, Some("  "), "Bob", None),
            "Bob [<code>7</code>]"
        );
    }

    #[test]
    fn user_label_escapes_html() {
        assert_eq!(
            format_user_label(1, None, "<b>x</b>", None),
            "&lt;b&gt;x&lt;/b&gt; [<code>1</code>]"
        );
    }

    #[test]
    fn full_name_skips_blank_last_name() {
        assert_eq!(full_name("Ann", Some("")), "Ann");
        assert_eq!(full_name(" Ann ", Some("Lee")), "Ann Lee");
    }

    #[test]
    fn warning_progress_and_option_labels() {
        assert_eq!(format_warning_progress(2, 3), "2/3");
        assert_eq!(option_label("Mute", true), "Mute ✅");
        assert_eq!(option_label("Ban", false), "Ban");
    }
}
