//! Latest-version badges in rendered pages
//!
//! Templates render a version badge with a class placeholder and attributes
//! describing the page, followed by a "go to latest" link carrying a version
//! placeholder:
//!
//! ```text
//! <div class="DetailsHeader-badge $$GODISCOVERY_LATESTMINORCLASS$$"
//!      data-version="v1.0.0" data-mpath="p1/p2" data-ppath="p1/p2/p3" data-pagetype="pkg">
//!   <a href="p1/p2@$$GODISCOVERY_LATESTMINORVERSION$$/p3">Go to latest</a>
//! </div>
//! ```
//!
//! The annotator fills both placeholders once the page has been rendered.
//! A class placeholder inside a badge's own tag belongs to that badge, in
//! whatever order the tag's attributes appear. Every other placeholder belongs
//! to the closest badge opened before it, or to the first badge when none
//! was. Once one badge matches, no placeholder is left in the page. A page
//! without badge attributes is returned unchanged.

use std::borrow::Cow;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use futures::future::join_all;
use regex::bytes::Regex;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_LENGTH, HeaderMap, HeaderValue};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::{Error, Result};
use crate::latest::classifier::classify;
use crate::latest::lookup::LatestVersionLookup;

/// Placeholder for the badge's CSS class
pub const CLASS_PLACEHOLDER: &str = "$$GODISCOVERY_LATESTMINORCLASS$$";
/// Placeholder for the latest version inside the badge's link
pub const VERSION_PLACEHOLDER: &str = "$$GODISCOVERY_LATESTMINORVERSION$$";

static BADGE_ATTRS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"data-version="([^"]*)" data-mpath="([^"]*)" data-ppath="([^"]*)" data-pagetype="([^"]*)""#,
    )
    .expect("badge attribute pattern is valid")
});

/// Shared start of both placeholders
const PLACEHOLDER_PREFIX: &[u8] = b"$$GODISCOVERY_LATESTMINOR";

/// Named references the renderer may produce inside attribute values.
/// Numeric references are decoded generically.
const NAMED_ENTITIES: [(&str, char); 5] = [
    ("&quot;", '"'),
    ("&apos;", '\''),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&amp;", '&'),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Class,
    Version,
}

impl Placeholder {
    /// The placeholder `text` starts with, if any.
    fn at_start(text: &[u8]) -> Option<Self> {
        if text.starts_with(CLASS_PLACEHOLDER.as_bytes()) {
            Some(Placeholder::Class)
        } else if text.starts_with(VERSION_PLACEHOLDER.as_bytes()) {
            Some(Placeholder::Version)
        } else {
            None
        }
    }

    fn len(self) -> usize {
        match self {
            Placeholder::Class => CLASS_PLACEHOLDER.len(),
            Placeholder::Version => VERSION_PLACEHOLDER.len(),
        }
    }
}

/// Page identity a latest version is looked up for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PageKey {
    path: String,
    module_path: String,
    page_type: String,
}

/// A matched badge. `tag_start..tag_end` spans the tag holding its attributes.
#[derive(Debug)]
struct Badge {
    tag_start: usize,
    tag_end: usize,
    version: String,
    key: PageKey,
}

/// A rendered response waiting to be written
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RenderedPage {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

pub struct LatestAnnotator<L: LatestVersionLookup + ?Sized> {
    lookup: Arc<L>,
}

impl<L: LatestVersionLookup + ?Sized> LatestAnnotator<L> {
    pub fn new(lookup: Arc<L>) -> Self {
        Self { lookup }
    }

    /// Fills every badge placeholder in `body`.
    ///
    /// Each distinct page is looked up once; lookups for different pages run
    /// concurrently.
    pub async fn annotate(&self, body: &[u8]) -> Vec<u8> {
        let badges = find_badges(body);
        if badges.is_empty() {
            return body.to_vec();
        }
        let latest = self.lookup_all(&badges).await;
        debug!(
            "Annotating {} badges with {} latest lookups",
            badges.len(),
            latest.len()
        );

        let fills: Vec<(&str, Cow<'_, str>)> = badges
            .iter()
            .map(|badge| {
                let latest_version = latest.get(&badge.key).map(String::as_str).unwrap_or("");
                (
                    classify(&badge.version, latest_version).css_class(),
                    escape_attr(latest_version),
                )
            })
            .collect();

        let mut out = Vec::with_capacity(body.len());
        let mut cursor = 0;
        while let Some(found) = find_bytes(body, PLACEHOLDER_PREFIX, cursor) {
            out.extend_from_slice(&body[cursor..found]);
            match Placeholder::at_start(&body[found..]) {
                Some(placeholder) => {
                    let (class, version) = &fills[owner(&badges, found, placeholder)];
                    let value = match placeholder {
                        Placeholder::Class => *class,
                        Placeholder::Version => version.as_ref(),
                    };
                    out.extend_from_slice(value.as_bytes());
                    cursor = found + placeholder.len();
                }
                None => {
                    out.extend_from_slice(PLACEHOLDER_PREFIX);
                    cursor = found + PLACEHOLDER_PREFIX.len();
                }
            }
        }
        out.extend_from_slice(&body[cursor..]);
        out
    }

    /// Rewrites the body of `page`. Status and headers pass through, except
    /// that a `Content-Length` header is updated to the new body length.
    pub async fn annotate_page(&self, mut page: RenderedPage) -> RenderedPage {
        page.body = self.annotate(&page.body).await;
        if page.headers.contains_key(CONTENT_LENGTH) {
            page.headers
                .insert(CONTENT_LENGTH, HeaderValue::from(page.body.len()));
        }
        page
    }

    async fn lookup_all(&self, badges: &[Badge]) -> HashMap<PageKey, String> {
        let mut keys: Vec<&PageKey> = Vec::new();
        for badge in badges {
            if !keys.contains(&&badge.key) {
                keys.push(&badge.key);
            }
        }

        let lookups = keys.iter().map(|key| async move {
            let latest = self
                .lookup
                .latest(&key.path, &key.module_path, &key.page_type)
                .await;
            ((*key).clone(), latest)
        });
        join_all(lookups).await.into_iter().collect()
    }
}

fn find_badges(body: &[u8]) -> Vec<Badge> {
    BADGE_ATTRS
        .captures_iter(body)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let attr = |i: usize| {
                caps.get(i)
                    .map(|m| unescape_attr(&String::from_utf8_lossy(m.as_bytes())))
                    .unwrap_or_default()
            };
            Some(Badge {
                tag_start: body[..whole.start()]
                    .iter()
                    .rposition(|&b| b == b'<')
                    .unwrap_or(0),
                tag_end: body[whole.end()..]
                    .iter()
                    .position(|&b| b == b'>')
                    .map_or(body.len(), |i| whole.end() + i + 1),
                version: attr(1),
                key: PageKey {
                    module_path: attr(2),
                    path: attr(3),
                    page_type: attr(4),
                },
            })
        })
        .collect()
}

/// Index of the badge owning the placeholder at `at`. A class placeholder
/// inside a badge's tag belongs to that badge; anything else belongs to the
/// last badge whose tag opens before it, falling back to the first badge.
fn owner(badges: &[Badge], at: usize, placeholder: Placeholder) -> usize {
    if placeholder == Placeholder::Class {
        if let Some(i) = badges
            .iter()
            .position(|b| b.tag_start <= at && at < b.tag_end)
        {
            return i;
        }
    }
    badges
        .iter()
        .rposition(|b| b.tag_start <= at)
        .unwrap_or(0)
}

fn find_bytes(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|i| from + i)
}

/// Decodes character references in an attribute value. Unknown or malformed
/// references are kept verbatim.
fn unescape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(i) = rest.find('&') {
        out.push_str(&rest[..i]);
        rest = &rest[i..];
        match decode_reference(rest) {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decodes the reference `text` starts with into its character and length.
fn decode_reference(text: &str) -> Option<(char, usize)> {
    if let Some((entity, c)) = NAMED_ENTITIES.iter().find(|(e, _)| text.starts_with(e)) {
        return Some((*c, entity.len()));
    }
    let body = text.strip_prefix("&#")?;
    let end = body.find(';')?;
    let (radix, digits) = match body[..end].strip_prefix(['x', 'X']) {
        Some(hex) => (16, hex),
        None => (10, &body[..end]),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let c = u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)?;
    Some((c, "&#".len() + end + 1))
}

/// Escapes markup-significant characters. `+` stays literal so build
/// metadata reads naturally in links.
fn escape_attr(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Writes the final body of `page` to `writer`.
pub async fn write_page<W: AsyncWrite + Unpin>(writer: &mut W, page: &RenderedPage) -> Result<()> {
    writer.write_all(&page.body).await?;
    writer.flush().await?;
    Ok(())
}

/// Renders a page, annotates it and writes it out, all within `timeout`.
///
/// Nothing reaches `writer` until the page is fully rendered and annotated.
pub async fn serve_page<F, Fut, L, W>(
    render: F,
    annotator: &LatestAnnotator<L>,
    writer: &mut W,
    timeout: Duration,
) -> Result<RenderedPage>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<RenderedPage>>,
    L: LatestVersionLookup + ?Sized,
    W: AsyncWrite + Unpin,
{
    let serve = async {
        let page = render().await?;
        let page = annotator.annotate_page(page).await;
        write_page(writer, &page).await?;
        Ok::<_, Error>(page)
    };
    tokio::time::timeout(timeout, serve)
        .await
        .map_err(|_| Error::Timeout(timeout))?
}
