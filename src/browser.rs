use anyhow::{anyhow, Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use crate::capture::{PageCapture, RawBlock, RawImage, StructuralHints};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const INITIAL_WAIT_MS: u64 = 3000;
const SCROLL_WAIT_MS: u64 = 2000;
const SETTLE_WAIT_MS: u64 = 1000;
const MAX_CONTENT_PASSES: u32 = 15;
const MAX_REVIEW_PASSES: u32 = 10;

/// Drives a headless Chromium through a public page: navigation, infinite
/// scroll until the scroll height stabilizes, and one harvest of text blocks
/// (with structural hints), images, and page metadata per source. The
/// extraction engine never sees any of this machinery.
pub struct PaginationDriver {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

#[derive(Debug, Deserialize)]
struct HarvestedBlock {
    text: String,
    is_article_like: bool,
    has_rating_label: bool,
    rating_aria_label: Option<String>,
    rating_glyph_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HarvestedImage {
    url: String,
    alt: String,
}

#[derive(Debug, Deserialize)]
struct Harvest {
    blocks: Vec<HarvestedBlock>,
    images: Vec<HarvestedImage>,
    name: Option<String>,
    about: Option<String>,
    rating: Option<String>,
    phone: Option<String>,
    email: Option<String>,
}

impl PaginationDriver {
    pub async fn launch(headless: bool) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(1920, 1080)
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled");
        if !headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| anyhow!("Failed to build browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser. Is Chrome or Chromium installed and in PATH?")?;

        let handler_task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Capture the main page and its reviews tab. A reviews tab that fails to
    /// load contributes zero blocks, which is a valid empty outcome.
    pub async fn capture_page(&self, page_url: &str) -> Result<PageCapture> {
        let mut capture = PageCapture::new(page_url);

        let page = self.browser.new_page("about:blank").await?;
        page.set_user_agent(USER_AGENT).await?;

        let (passes, harvest) = harvest_source(&page, page_url, MAX_CONTENT_PASSES)
            .await
            .context("Failed to load main page")?;
        capture.scroll_passes = passes;
        apply_metadata(&mut capture, &harvest);
        append_harvest(&mut capture, harvest);
        info!(
            "Main page: {} blocks, {} images after {} scroll passes",
            capture.blocks.len(),
            capture.images.len(),
            passes
        );

        let reviews_url = format!("{}/reviews", page_url.trim_end_matches('/'));
        match harvest_source(&page, &reviews_url, MAX_REVIEW_PASSES).await {
            Ok((passes, harvest)) => {
                capture.scroll_passes += passes;
                append_harvest(&mut capture, harvest);
            }
            Err(e) => warn!("Could not harvest reviews tab: {:#}", e),
        }

        if let Err(e) = page.close().await {
            warn!("Failed to close page: {}", e);
        }
        Ok(capture)
    }

    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Browser close failed: {}", e);
        }
        self.handler_task.abort();
    }
}

async fn harvest_source(page: &Page, url: &str, max_passes: u32) -> Result<(u32, Harvest)> {
    info!("Loading {}", url);
    page.goto(url).await?;
    page.wait_for_navigation().await?;
    sleep(Duration::from_millis(INITIAL_WAIT_MS)).await;

    let passes = scroll_to_exhaustion(page, max_passes).await?;

    let harvest: Harvest = page
        .evaluate(HARVEST_JS)
        .await
        .context("Harvest script failed")?
        .into_value()
        .context("Harvest script returned an unexpected shape")?;
    Ok((passes, harvest))
}

/// Scroll to the bottom until the document height is unchanged across two
/// consecutive checks, or the pass ceiling is reached.
async fn scroll_to_exhaustion(page: &Page, max_passes: u32) -> Result<u32> {
    let pb = ProgressBar::new(max_passes as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} pass {pos}/{len}")?
            .progress_chars("=> "),
    );

    let mut last_height = body_height(page).await?;
    let mut passes = 0;
    while passes < max_passes {
        page.evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await?;
        sleep(Duration::from_millis(SCROLL_WAIT_MS)).await;

        let mut new_height = body_height(page).await?;
        if new_height == last_height {
            // One settle retry before declaring the stream exhausted
            sleep(Duration::from_millis(SETTLE_WAIT_MS)).await;
            new_height = body_height(page).await?;
            if new_height == last_height {
                break;
            }
        }
        last_height = new_height;
        passes += 1;
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(passes)
}

async fn body_height(page: &Page) -> Result<i64> {
    Ok(page
        .evaluate("document.body.scrollHeight")
        .await?
        .into_value()?)
}

fn apply_metadata(capture: &mut PageCapture, harvest: &Harvest) {
    if let Some(name) = &harvest.name {
        capture.business_name = Some(name.clone());
        capture.metadata.insert("name".into(), name.clone());
    } else {
        warn!("Could not extract business name");
    }
    if let Some(about) = &harvest.about {
        capture.metadata.insert("about".into(), about.clone());
    }
    if let Some(rating) = &harvest.rating {
        capture.metadata.insert("rating".into(), rating.clone());
    }
    if let Some(phone) = &harvest.phone {
        capture.metadata.insert("phone".into(), phone.clone());
    }
    if let Some(email) = &harvest.email {
        capture.metadata.insert("email".into(), email.clone());
    }
}

fn append_harvest(capture: &mut PageCapture, harvest: Harvest) {
    for b in harvest.blocks {
        capture.blocks.push(RawBlock {
            text: b.text,
            hints: StructuralHints {
                is_article_like: b.is_article_like,
                has_rating_label: b.has_rating_label,
                rating_aria_label: b.rating_aria_label,
                rating_glyph_text: b.rating_glyph_text,
            },
        });
    }
    for i in harvest.images {
        capture.images.push(RawImage {
            url: i.url,
            alt: i.alt,
        });
    }
}

/// Runs inside the page: collects `[role="article"]` text blocks with their
/// rating hints, CDN-hosted images, and the page-level metadata fields.
const HARVEST_JS: &str = r#"(() => {
    const blocks = [];
    for (const el of document.querySelectorAll('[role="article"]')) {
        const text = el.innerText || '';
        if (!text) continue;
        const rated = el.querySelector('[aria-label*="out of 5"]');
        const aria = rated ? rated.getAttribute('aria-label') : null;
        let glyphs = null;
        for (const span of el.querySelectorAll('span')) {
            const t = span.textContent || '';
            if (t.includes('★')) { glyphs = t; break; }
        }
        blocks.push({
            text: text,
            is_article_like: true,
            has_rating_label: aria !== null,
            rating_aria_label: aria,
            rating_glyph_text: glyphs
        });
    }
    const images = [];
    for (const img of document.querySelectorAll('img[src*="scontent"], img[src*="fbcdn"]')) {
        images.push({ url: img.getAttribute('src') || '', alt: img.getAttribute('alt') || '' });
    }
    const h1 = document.querySelector('h1');
    let about = null;
    for (const sel of ['div[data-ad-comet-preview="message"]', 'div[data-testid="about_text"]']) {
        const el = document.querySelector(sel);
        if (el && el.innerText) { about = el.innerText; break; }
    }
    let rating = null;
    for (const span of document.querySelectorAll('span')) {
        const t = span.textContent || '';
        if (t.includes('★')) { rating = t; break; }
    }
    const tel = document.querySelector('a[href^="tel:"]');
    const mail = document.querySelector('a[href^="mailto:"]');
    return {
        blocks: blocks,
        images: images,
        name: h1 ? h1.innerText : null,
        about: about,
        rating: rating,
        phone: tel ? tel.innerText : null,
        email: mail ? (mail.getAttribute('href') || '').replace('mailto:', '') : null
    };
})()"#;
