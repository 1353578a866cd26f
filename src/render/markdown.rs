//! Markdown image, link and emphasis patterns

use super::{BrandColors, MediaRef};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]+)\]\(([^)]+)\)").expect("valid image pattern"));

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link pattern"));

pub(super) static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid bold pattern"));

pub(super) static LEGACY_BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"###([^#]+)###").expect("valid legacy bold pattern"));

/// Replace `![alt](url)` with a framed, clickable image, then drop one
/// trailing period from the line.
///
/// Must run before [`convert_links`]: the link pattern also matches the
/// bracket/paren tail of an image.
pub(super) fn convert_images<'a>(line: &'a str, brand: &BrandColors) -> Cow<'a, str> {
    let converted = IMAGE.replace_all(line, |caps: &Captures| {
        format!(
            r#"<div style="background-color: {frame}; margin-top: 10px; margin-bottom: 10px; padding: 5px 5px 2px; box-shadow: #474747 0 0 6px; border-radius: 6px; overflow: hidden; width: fit-content"><a title="{alt}" target="_blank" href="{url}"><img style="max-width: 100%;" alt="{alt}" src="{url}" /></a></div>"#,
            frame = brand.frame,
            alt = attribute(&caps[1]),
            url = attribute(&caps[2]),
        )
    });
    drop_trailing_period(converted)
}

/// Replace `[text](url)` with a brand-colored link, then drop one trailing
/// period from the line.
pub(super) fn convert_links<'a>(line: &'a str, brand: &BrandColors) -> Cow<'a, str> {
    let converted = LINK.replace_all(line, |caps: &Captures| {
        format!(
            r#"<a style="color: {color}; font-weight: 600; margin-top: 10px; margin-bottom: 10px;" title="{title}" target="_blank" href="{url}">{text}</a>"#,
            color = brand.link,
            title = attribute(&caps[1]),
            text = &caps[1],
            url = attribute(&caps[2]),
        )
    });
    drop_trailing_period(converted)
}

// Generated replies often end a line with a stray period.
fn drop_trailing_period(line: Cow<'_, str>) -> Cow<'_, str> {
    match line {
        Cow::Borrowed(s) => Cow::Borrowed(s.strip_suffix('.').unwrap_or(s)),
        Cow::Owned(mut s) => {
            if s.ends_with('.') {
                s.pop();
            }
            Cow::Owned(s)
        }
    }
}

/// Attribute value with emphasis markers as character references, so the
/// later bold passes never rewrite inside a generated tag.
fn attribute(value: &str) -> Cow<'_, str> {
    if !value.contains(['*', '#']) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(value.replace('*', "&#42;").replace('#', "&#35;"))
}

/// Every markdown image in `text`, in order of appearance.
pub fn collect_media(text: &str) -> Vec<MediaRef> {
    IMAGE
        .captures_iter(text)
        .map(|caps| MediaRef {
            alt: caps[1].to_string(),
            url: caps[2].to_string(),
        })
        .collect()
}
