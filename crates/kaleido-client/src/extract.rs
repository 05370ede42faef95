//! Selector-based extraction of portal markup.
//!
//! The portal's markup contract is fixed: catalog rows are `li.item`,
//! pagination is signalled by `li.pagerNext`, the change page exposes the
//! default selection under `div.dfultSlct` and reports expired sessions
//! with `div#error`. Malformed attributes degrade to empty strings; a bad
//! row never fails the whole scrape.

use std::sync::{LazyLock, OnceLock};

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use kaleido_core::models::{ChangeOutcome, Effect, EffectListPage};

/// Query parameter carrying the selection security token.
const SEC_KEY_PARAM: &str = "__DL__SEC__KEY__";

/// Query parameter carrying an item's hash id.
const HASH_ID_PARAM: &str = "ti";

static IMAGE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"theme_(\d+)\.jpg").expect("valid image id regex"));

static ITEM_SEL: LazyLock<Selector> = LazyLock::new(|| parse_selector("li.item"));
static NAME_SEL: LazyLock<Selector> = LazyLock::new(|| parse_selector("div.name"));
static IMG_SEL: LazyLock<Selector> = LazyLock::new(|| parse_selector("img"));
static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| parse_selector("a"));
static PAGER_NEXT_SEL: LazyLock<Selector> = LazyLock::new(|| parse_selector("li.pagerNext"));
static ERROR_SEL: LazyLock<Selector> = LazyLock::new(|| parse_selector("div#error"));
static DEFAULT_SLOT_SEL: LazyLock<Selector> = LazyLock::new(|| parse_selector("div.dfultSlct a"));

fn parse_selector(selector: &str) -> Selector {
    Selector::parse(selector).expect("valid selector literal")
}

/// Parse one page of the effect catalog.
pub fn parse_effect_list(html: &str) -> EffectListPage {
    let document = Html::parse_document(html);

    let mut effects = Vec::new();
    let dl_sec_key: OnceLock<String> = OnceLock::new();

    for item in document.select(&ITEM_SEL) {
        let name = item
            .select(&NAME_SEL)
            .next()
            .map(|node| node.text().collect::<String>().trim().to_string())
            .unwrap_or_default();
        let img_src = item
            .select(&IMG_SEL)
            .next()
            .and_then(|img| img.value().attr("src"))
            .unwrap_or_default();
        let href = item
            .select(&ANCHOR_SEL)
            .next()
            .and_then(|anchor| anchor.value().attr("href"))
            .unwrap_or_default();

        // The portal only exposes the security token on the first row's
        // link; the set-once cell keeps any later row from overwriting it.
        dl_sec_key.get_or_init(|| query_param(href, SEC_KEY_PARAM));

        effects.push(Effect {
            name,
            id: id_from_img_src(img_src),
            hash_id: query_param(href, HASH_ID_PARAM),
        });
    }

    let has_next = document.select(&PAGER_NEXT_SEL).next().is_some();

    EffectListPage {
        effects,
        dl_sec_key: dl_sec_key.get().cloned().unwrap_or_default(),
        has_next,
    }
}

/// Parse the response of a change-selection request.
///
/// The error marker means the session has expired: both identifiers are
/// cleared so the caller knows to log in again.
pub fn parse_change_result(html: &str, session_id: &str) -> ChangeOutcome {
    let document = Html::parse_document(html);

    if document.select(&ERROR_SEL).next().is_some() {
        tracing::warn!("portal reported an expired session");
        return ChangeOutcome {
            succeed: false,
            session_id: String::new(),
            dl_sec_key: String::new(),
        };
    }

    let dl_sec_key = document
        .select(&DEFAULT_SLOT_SEL)
        .next()
        .and_then(|anchor| anchor.value().attr("href"))
        .map(|href| query_param(href, SEC_KEY_PARAM))
        .unwrap_or_default();

    ChangeOutcome {
        succeed: true,
        session_id: session_id.to_string(),
        dl_sec_key,
    }
}

/// Extract the numeric effect id from a preview image `src`.
fn id_from_img_src(src: &str) -> String {
    IMAGE_ID_RE
        .captures(src)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
        .unwrap_or_default()
}

/// Read a query parameter out of an absolute or relative href.
///
/// Malformed URLs yield an empty string rather than an error.
fn query_param(href: &str, name: &str) -> String {
    let parsed = match Url::parse(href) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse("http://portal.invalid/").and_then(|base| base.join(href))
        }
        Err(e) => Err(e),
    };

    match parsed {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default(),
        Err(e) => {
            tracing::debug!(error = %e, "skipping malformed href");
            String::new()
        }
    }
}
