use std::sync::Arc;

use async_trait::async_trait;
use time::{Date, Duration};
use tracing::{debug, info};

use super::adapter::{Adapter, AdapterError, DocumentRun};
use crate::application::render::{Artifact, RenderContext, RenderError, SocialRenderer};
use crate::application::sources::SocialTarget;
use crate::domain::documents::Document;

const TAGS: &[&str] = &["tweet"];

/// Posts documents as reply chains, assigning publish dates when missing.
pub struct SocialAdapter {
    renderer: SocialRenderer,
    target: Arc<dyn SocialTarget>,
    spread: Duration,
}

impl SocialAdapter {
    pub fn new(renderer: SocialRenderer, target: Arc<dyn SocialTarget>, spread: Duration) -> Self {
        Self {
            renderer,
            target,
            spread,
        }
    }
}

/// Next free slot: the latest date among other ready documents sharing one of
/// `tags`, or `today` when that is later, plus `spread`.
pub fn next_publish_date(
    document: &Document,
    ready: &[Document],
    tags: &[&str],
    today: Date,
    spread: Duration,
) -> Date {
    let latest = ready
        .iter()
        .filter(|other| other.id != document.id)
        .filter(|other| tags.iter().any(|tag| other.has_category(tag)))
        .filter_map(|other| other.publish_date)
        .max();

    let base = match latest {
        Some(latest) if latest > today => latest,
        _ => today,
    };
    base.checked_add(spread).unwrap_or(base)
}

#[async_trait]
impl Adapter for SocialAdapter {
    fn name(&self) -> &'static str {
        "social"
    }

    fn tags(&self) -> &'static [&'static str] {
        TAGS
    }

    fn extension(&self) -> &'static str {
        "txt"
    }

    async fn preflight(&self, run: &mut DocumentRun<'_>) -> Result<bool, AdapterError> {
        if run.document.publish_date.is_none() {
            let date = next_publish_date(
                &run.document,
                run.ready,
                TAGS,
                run.now.date(),
                self.spread,
            );
            if !run.dry_run {
                run.properties.set_publish_date(date).await?;
            }
            run.document.publish_date = Some(date);
            run.refresh_eligibility();

            info!(
                target = "application::publish::social",
                document_id = %run.document.id,
                date = %date,
                persisted = !run.dry_run,
                "assigned publish date"
            );
        }

        Ok(run.is_releasable())
    }

    async fn render(
        &self,
        run: &DocumentRun<'_>,
        ctx: &mut RenderContext,
    ) -> Result<Option<Artifact>, AdapterError> {
        match self.renderer.render(run.tree, ctx).await {
            Ok(segments) => Ok(Some(Artifact::Thread(segments))),
            Err(RenderError::Validation(failure)) => {
                ctx.flag(failure);
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn publish(&self, run: &DocumentRun<'_>, artifact: &Artifact) -> Result<(), AdapterError> {
        let Artifact::Thread(segments) = artifact else {
            return Err(AdapterError::UnexpectedArtifact);
        };

        let mut reply_to: Option<String> = None;
        for (index, segment) in segments.iter().enumerate() {
            if segment.text.is_empty() && segment.media_ids.is_empty() {
                continue;
            }

            let post_id = self
                .target
                .post(&segment.text, &segment.media_ids, reply_to.as_deref())
                .await?;

            debug!(
                target = "application::publish::social",
                document_id = %run.document.id,
                segment = index,
                post_id = %post_id,
                "posted segment"
            );
            reply_to = Some(post_id);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    fn tweet(id: &str, date: Option<Date>) -> Document {
        let mut document = Document::new(id);
        document.categories = vec!["tweet".to_string()];
        document.publish_date = date;
        document
    }

    #[test]
    fn next_date_follows_latest_scheduled() {
        let ready = vec![
            tweet("a", Some(date!(2024 - 06 - 10))),
            tweet("b", Some(date!(2024 - 06 - 12))),
            tweet("c", None),
        ];
        let date = next_publish_date(&ready[2], &ready, TAGS, date!(2024 - 06 - 01), Duration::days(1));
        assert_eq!(date, date!(2024 - 06 - 13));
    }

    #[test]
    fn next_date_never_lands_in_the_past() {
        let ready = vec![tweet("a", Some(date!(2024 - 01 - 01))), tweet("b", None)];
        let date = next_publish_date(&ready[1], &ready, TAGS, date!(2024 - 06 - 01), Duration::days(2));
        assert_eq!(date, date!(2024 - 06 - 03));
    }

    #[test]
    fn other_categories_are_ignored() {
        let mut blog = Document::new("blog");
        blog.categories = vec!["blog".to_string()];
        blog.publish_date = Some(date!(2030 - 01 - 01));
        let ready = vec![blog, tweet("t", None)];

        let date = next_publish_date(&ready[1], &ready, TAGS, date!(2024 - 06 - 01), Duration::days(1));
        assert_eq!(date, date!(2024 - 06 - 02));
    }
}
