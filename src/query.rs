use crate::config::{ReviewQueryConfig, FIRST_PAGE_CURSOR};

/// Builds review-page URLs for one storefront endpoint.
///
/// Parameters are appended in a fixed order: filter, language, day_range,
/// cursor, review_type, purchase_type, num_per_page, filter_offtopic_activity.
/// Unset or empty options are left off entirely.
#[derive(Debug, Clone)]
pub struct ReviewUrlBuilder<'a> {
    base_url: &'a str,
    config: &'a ReviewQueryConfig,
}

impl<'a> ReviewUrlBuilder<'a> {
    pub fn new(base_url: &'a str, config: &'a ReviewQueryConfig) -> Self {
        Self { base_url, config }
    }

    /// URL for `app_id` at `cursor`. The cursor is taken raw (as returned by
    /// the storefront) and percent-encoded here; `"*"` or an empty cursor
    /// requests the first page and adds no parameter.
    pub fn build(&self, app_id: i64, cursor: &str) -> String {
        let cfg = self.config;
        let mut url = format!("{}/{}?json=1", self.base_url.trim_end_matches('/'), app_id);

        push_param(&mut url, "filter", cfg.filter.map(|f| f.as_str()));
        push_param(&mut url, "language", cfg.language.as_deref());
        push_param(&mut url, "day_range", cfg.day_range().map(|d| d.to_string()).as_deref());
        if cursor != FIRST_PAGE_CURSOR {
            push_param(&mut url, "cursor", Some(encode_cursor(cursor).as_str()));
        }
        push_param(&mut url, "review_type", cfg.review_type.map(|t| t.as_str()));
        push_param(&mut url, "purchase_type", cfg.purchase_type.map(|t| t.as_str()));
        push_param(
            &mut url,
            "num_per_page",
            cfg.num_per_page().map(|n| n.to_string()).as_deref(),
        );
        push_param(
            &mut url,
            "filter_offtopic_activity",
            cfg.filter_offtopic_activity.map(|on| if on { "1" } else { "0" }),
        );
        url
    }
}

/// Percent-encode an opaque storefront cursor for use in a query string.
pub fn encode_cursor(cursor: &str) -> String {
    urlencoding::encode(cursor).into_owned()
}

fn push_param(url: &mut String, key: &str, value: Option<&str>) {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return;
    };
    url.push('&');
    url.push_str(key);
    url.push('=');
    url.push_str(value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PurchaseType, ReviewFilter, ReviewType};

    const BASE: &str = "https://store.steampowered.com/appreviews/";

    fn full_config() -> ReviewQueryConfig {
        let mut cfg = ReviewQueryConfig::default()
            .with_day_range(Some(30))
            .with_num_per_page(Some(100));
        cfg.filter = Some(ReviewFilter::Recent);
        cfg.language = Some("german,english".into());
        cfg.review_type = Some(ReviewType::Positive);
        cfg.purchase_type = Some(PurchaseType::Steam);
        cfg.filter_offtopic_activity = Some(false);
        cfg
    }

    #[test]
    fn appends_parameters_in_fixed_order() {
        let cfg = full_config();
        let url = ReviewUrlBuilder::new(BASE, &cfg).build(440, "abc");
        assert_eq!(
            url,
            "https://store.steampowered.com/appreviews/440?json=1\
             &filter=recent&language=german,english&day_range=30&cursor=abc\
             &review_type=positive&purchase_type=steam&num_per_page=100\
             &filter_offtopic_activity=0"
        );
    }

    #[test]
    fn omits_unset_and_empty_options() {
        let mut cfg = ReviewQueryConfig::empty();
        cfg.language = Some(String::new());
        let url = ReviewUrlBuilder::new(BASE, &cfg).build(10, "*");
        assert_eq!(url, "https://store.steampowered.com/appreviews/10?json=1");

        cfg.language = None;
        assert_eq!(ReviewUrlBuilder::new(BASE, &cfg).build(10, "*"), url);
    }

    #[test]
    fn non_empty_values_are_passed_through_verbatim() {
        let mut cfg = ReviewQueryConfig::empty();
        cfg.language = Some(" english ".into());
        let url = ReviewUrlBuilder::new(BASE, &cfg).build(10, "*");
        assert_eq!(
            url,
            "https://store.steampowered.com/appreviews/10?json=1&language= english "
        );
    }

    #[test]
    fn first_page_cursor_never_appears() {
        let cfg = full_config();
        let url = ReviewUrlBuilder::new(BASE, &cfg).build(440, "*");
        assert!(!url.contains("cursor"));
        assert!(!url.contains('*'));
    }

    #[test]
    fn cursor_is_percent_encoded() {
        let cfg = ReviewQueryConfig::empty();
        let url = ReviewUrlBuilder::new(BASE, &cfg).build(100, "AoJw/+a=");
        assert_eq!(
            url,
            "https://store.steampowered.com/appreviews/100?json=1&cursor=AoJw%2F%2Ba%3D"
        );
    }

    #[test]
    fn tolerates_base_without_trailing_slash() {
        let cfg = ReviewQueryConfig::empty();
        let url = ReviewUrlBuilder::new("http://localhost:8080/appreviews", &cfg).build(7, "*");
        assert_eq!(url, "http://localhost:8080/appreviews/7?json=1");
    }
}
