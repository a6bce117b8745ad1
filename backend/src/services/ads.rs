//! Ad snippet injection shared by every detail-style page.
//!
//! Besides the snippet fields, the composed context carries the language list
//! and a random sample of other live apps.

use adapters::{AdSnippet, App, ContentStore, Lang, StoreResult};

use super::context::Context;

pub const AD_ABOVE_CONTENT: &str = "ad_above_content";
pub const AD_BELOW_IMAGE: &str = "ad_below_image";
pub const AD_BELOW_CONTENT: &str = "ad_below_content";
pub const AD_SIDEBAR_CONTENT: &str = "ad_sidebar_content";
pub const AD_HEADER: &str = "header_scripts";
pub const AD_FOOTER: &str = "footer_scripts";

#[derive(Debug, Clone)]
pub struct AdsContext {
    pub languages: Vec<Lang>,
    pub related: Vec<App>,
    pub snippet: Option<AdSnippet>,
}

impl AdsContext {
    /// Loads everything the ad layout needs for a page showing `object_id`.
    pub async fn compose(
        store: &dyn ContentStore,
        site_id: i64,
        object_id: i64,
        related_limit: usize,
    ) -> StoreResult<Self> {
        let snippet = store.ad_snippet(site_id).await?;
        let related = store.sample_apps(object_id, related_limit).await?;
        let languages = store.languages().await?;
        Ok(Self {
            languages,
            related,
            snippet,
        })
    }

    /// Writes `languages`, `apps` and, when the site has a snippet, the six
    /// ad slots into `ctx`.
    pub fn apply(&self, ctx: &mut Context) -> Result<(), serde_json::Error> {
        ctx.set("languages", &self.languages)?
            .set("apps", &self.related)?;

        if let Some(snippet) = &self.snippet {
            ctx.set(AD_ABOVE_CONTENT, &snippet.ad_above_content)?
                .set(AD_BELOW_IMAGE, &snippet.ad_below_image)?
                .set(AD_BELOW_CONTENT, &snippet.ad_below_content)?
                .set(AD_SIDEBAR_CONTENT, &snippet.ad_sidebar_content)?
                .set(AD_HEADER, &snippet.header)?
                .set(AD_FOOTER, &snippet.footer)?;
        }
        Ok(())
    }
}
