//! Slugs for products, articles and categories.

use std::future::Future;

use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};

use crate::error::AppResult;

/// How many numbered variants are tried before falling back to a timestamp.
pub const MAX_SLUG_ATTEMPTS: u32 = 100;

const RANDOM_SUFFIX_LEN: usize = 8;

/// Lowercase, hyphen-separated ASCII form of `name`. Common Latin
/// diacritics are folded; anything else becomes a separator. When nothing
/// survives, `fallback_prefix` plus a random suffix is returned, so the
/// result is never empty.
pub fn generate_slug(name: &str, fallback_prefix: &str) -> String {
    let slug = normalize(name);
    if slug.is_empty() {
        return format!("{}-{}", normalize_or(fallback_prefix, "item"), random_suffix());
    }
    slug
}

fn normalize_or(value: &str, default: &str) -> String {
    let normalized = normalize(value);
    if normalized.is_empty() {
        default.to_string()
    } else {
        normalized
    }
}

fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars().flat_map(char::to_lowercase) {
        let mut buf = [0u8; 4];
        let folded: Option<&str> = if ch.is_ascii_alphanumeric() {
            Some(ch.encode_utf8(&mut buf))
        } else {
            fold_latin(ch)
        };

        match folded {
            Some(text) => {
                if pending_dash && !out.is_empty() {
                    out.push('-');
                }
                pending_dash = false;
                out.push_str(text);
            }
            // apostrophes vanish instead of splitting words
            None if matches!(ch, '\'' | '’') => {}
            None => pending_dash = true,
        }
    }

    out
}

fn fold_latin(ch: char) -> Option<&'static str> {
    let s = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
        'ł' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ś' | 'š' | 'ş' => "s",
        'ß' => "ss",
        'ť' | 'ţ' => "t",
        'þ' => "th",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        '&' => "and",
        _ => return None,
    };
    Some(s)
}

fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Returns `base` if free, otherwise the first free `base-N` for
/// `N in 1..=MAX_SLUG_ATTEMPTS`, otherwise `base-<unix nanos>`.
///
/// `exists` must reflect committed state; the unique index on the table is
/// still the final arbiter.
pub async fn ensure_unique_slug<F, Fut>(base: &str, mut exists: F) -> AppResult<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = AppResult<bool>>,
{
    if !exists(base.to_string()).await? {
        return Ok(base.to_string());
    }

    for counter in 1..=MAX_SLUG_ATTEMPTS {
        let candidate = format!("{base}-{counter}");
        if !exists(candidate.clone()).await? {
            return Ok(candidate);
        }
    }

    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1_000);
    tracing::warn!(base, "slug candidates exhausted, using timestamp suffix");
    Ok(format!("{base}-{nanos}"))
}

/// Same as [`ensure_unique_slug`], but `current` (the slug the entity being
/// edited already holds) counts as available.
pub async fn ensure_unique_slug_except<F, Fut>(
    base: &str,
    current: &str,
    mut exists: F,
) -> AppResult<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = AppResult<bool>>,
{
    ensure_unique_slug(base, |candidate| {
        let own = candidate == current;
        let check = exists(candidate);
        async move {
            if own {
                return Ok(false);
            }
            check.await
        }
    })
    .await
}

/// Cuts `description` at the last space before `max_chars` characters and
/// appends an ellipsis. Short descriptions come back unchanged.
pub fn generate_excerpt(description: &str, max_chars: usize) -> String {
    if description.chars().count() <= max_chars {
        return description.to_string();
    }

    let cut = description
        .char_indices()
        .nth(max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(description.len());
    let head = &description[..cut];
    let end = head.rfind(' ').filter(|idx| *idx > 0).unwrap_or(cut);

    format!("{}...", head[..end].trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_diacritics_and_collapses_separators() {
        assert_eq!(generate_slug("  Batik Tulis -- Solo!! ", "product"), "batik-tulis-solo");
        assert_eq!(generate_slug("Crème Brûlée", "product"), "creme-brulee");
        assert_eq!(generate_slug("Kain's Shop", "store"), "kains-shop");
    }

    #[test]
    fn empty_normalization_uses_prefix() {
        let slug = generate_slug("!!!", "article");
        assert!(slug.starts_with("article-"));
        assert_eq!(slug.len(), "article-".len() + RANDOM_SUFFIX_LEN);
    }
}
