//! Generator module - turns repository posts into static HTML pages

use anyhow::{Context as _, Result};
use chrono_tz::Tz;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tera::Context;

use crate::content::{reading_time, Post};
use crate::helpers::{
    date_xml, format_publication_date, full_url_for, heading_anchor, html_escape, image_tag,
    is_valid_uid, post_path, resolve_timezone, url_for, Locale, POST_ROUTE,
};
use crate::richtext::RichText;
use crate::store::ContentStore;
use crate::templates::{BlockView, ConfigData, PostView, TemplateRenderer};
use crate::Site;

/// Seconds the loading page waits before asking again
pub const LOADING_REFRESH_SECS: u32 = 2;

/// A path known at build time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPath {
    pub uid: String,
    pub path: String,
}

/// Everything needed to render one post page
#[derive(Debug, Clone)]
pub struct PostProps {
    pub post: Post,
    pub view: PostView,
    /// How long the rendered page stays fresh
    pub revalidate: Duration,
}

/// Outcome of a full build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateSummary {
    pub generated: Vec<String>,
    /// Enumerated uids the repository no longer returned
    pub missing: Vec<String>,
}

/// Static page generator for posts
pub struct Generator {
    site: Site,
    store: Arc<dyn ContentStore>,
    renderer: TemplateRenderer,
    locale: Locale,
    timezone: Tz,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Site, store: Arc<dyn ContentStore>) -> Result<Self> {
        let renderer = TemplateRenderer::new()?;

        Ok(Self {
            site: site.clone(),
            store,
            renderer,
            locale: Locale::from_tag(&site.config.language),
            timezone: resolve_timezone(&site.config.timezone),
        })
    }

    fn post_type(&self) -> &str {
        &self.site.config.prismic.post_type
    }

    /// Enumerate one routable path per post in the repository
    pub async fn static_paths(&self) -> Result<Vec<StaticPath>> {
        let documents = self
            .store
            .query_by_type(self.post_type())
            .await
            .with_context(|| format!("Failed to list documents of type {}", self.post_type()))?;

        let mut seen = HashSet::new();
        let mut paths = Vec::with_capacity(documents.len());

        for document in documents {
            let Some(uid) = document.uid.filter(|u| !u.is_empty()) else {
                tracing::warn!("Skipping document {} without uid", document.id);
                continue;
            };
            if !is_valid_uid(&uid) {
                tracing::warn!("Skipping document {} with unroutable uid {:?}", document.id, uid);
                continue;
            }
            if !seen.insert(uid.clone()) {
                tracing::warn!("Duplicate uid {:?}, keeping the first document", uid);
                continue;
            }
            paths.push(StaticPath {
                path: post_path(&uid),
                uid,
            });
        }

        tracing::debug!("Enumerated {} post paths", paths.len());
        Ok(paths)
    }

    /// Fetch one post and assemble its props
    ///
    /// `Ok(None)` means the repository has no such post.
    pub async fn static_props(&self, uid: &str) -> Result<Option<PostProps>> {
        let document = self
            .store
            .get_by_uid(self.post_type(), uid)
            .await
            .with_context(|| format!("Failed to fetch post {}", uid))?;

        let Some(document) = document else {
            tracing::info!("Post {} not found", uid);
            return Ok(None);
        };

        let post = Post::from_document(document)?;
        let view = self.build_view(&post);

        Ok(Some(PostProps {
            post,
            view,
            revalidate: self.site.config.revalidate_after(),
        }))
    }

    /// Derive the template view of a post
    pub fn build_view(&self, post: &Post) -> PostView {
        let date = format_publication_date(
            post.first_publication_date.as_ref(),
            &self.site.config.date_format,
            self.locale,
            self.timezone,
        );
        let date_xml = post
            .first_publication_date
            .as_ref()
            .map(|d| date_xml(&d.with_timezone(&self.timezone)));

        let mut anchors = Vec::new();
        let mut headings = HashSet::new();
        let blocks = post
            .content
            .iter()
            .map(|block| {
                if !headings.insert(block.heading.as_str()) {
                    tracing::warn!("Post {} repeats heading {:?}", post.uid, block.heading);
                }
                let anchor = heading_anchor(&block.heading, &mut anchors);
                BlockView {
                    heading: html_escape(&block.heading),
                    anchor,
                    html: block.body.as_html(),
                }
            })
            .collect();

        PostView {
            uid: post.uid.clone(),
            path: url_for(&self.site.config, &post_path(&post.uid)),
            title: html_escape(&post.title),
            banner: banner_tag(post),
            author: html_escape(&post.author),
            date: date.map(|d| html_escape(&d)),
            date_xml,
            reading_time: reading_time(&post.content, self.site.config.reading.words_per_minute),
            blocks,
        }
    }

    fn base_context(&self, page_title: &str) -> Context {
        let config = &self.site.config;
        let mut context = Context::new();
        context.insert(
            "config",
            &ConfigData {
                title: html_escape(&config.title),
                root: url_for(config, "/"),
                language: html_escape(&config.language),
            },
        );
        context.insert("page_title", page_title);
        context.insert("canonical", "");
        context.insert("refresh_seconds", &0);
        context
    }

    /// Render the page of a post
    pub fn render_post(&self, props: &PostProps) -> Result<String> {
        let mut context = self.base_context(&props.view.title);
        if !self.site.config.url.is_empty() {
            context.insert(
                "canonical",
                &html_escape(&full_url_for(&self.site.config, &post_path(&props.post.uid))),
            );
        }
        context.insert("post", &props.view);
        self.renderer.render("post.html", &context)
    }

    /// Page shown while a post that was not built yet is being generated
    pub fn render_loading(&self) -> Result<String> {
        let mut context = self.base_context("");
        context.insert("refresh_seconds", &LOADING_REFRESH_SECS);
        context.insert("message", loading_message(self.locale));
        self.renderer.render("loading.html", &context)
    }

    /// Page shown for a uid the repository does not know
    pub fn render_not_found(&self, uid: &str) -> Result<String> {
        let mut context = self.base_context("");
        context.insert(
            "message",
            &format!("{}: {}", not_found_message(self.locale), html_escape(uid)),
        );
        self.renderer.render("not_found.html", &context)
    }

    /// Page shown when a post could not be generated
    ///
    /// The message is fixed; failure details only go to the log.
    pub fn render_error(&self) -> Result<String> {
        let mut context = self.base_context("");
        context.insert("message", error_message(self.locale));
        self.renderer.render("error.html", &context)
    }

    /// Output file of a post page
    pub fn output_path(&self, uid: &str) -> PathBuf {
        self.site
            .public_dir
            .join(POST_ROUTE)
            .join(uid)
            .join("index.html")
    }

    /// Write a rendered page to the public directory
    pub fn write_post(&self, uid: &str, html: &str) -> Result<PathBuf> {
        let output_path = self.output_path(uid);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
        }
        fs::write(&output_path, html)
            .map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", output_path, e))?;
        tracing::debug!("Generated post: {:?}", output_path);
        Ok(output_path)
    }

    /// Fetch, render and write one post; `Ok(None)` when it does not exist
    pub async fn generate_post(&self, uid: &str) -> Result<Option<String>> {
        let Some(props) = self.static_props(uid).await? else {
            let stale = self.output_path(uid);
            if stale.exists() {
                fs::remove_file(&stale)?;
                tracing::info!("Removed page of deleted post: {:?}", stale);
            }
            return Ok(None);
        };
        let html = self.render_post(&props)?;
        self.write_post(uid, &html)?;
        Ok(Some(html))
    }

    /// Build every enumerated post
    ///
    /// Any fetch failure aborts the build.
    pub async fn generate_all(&self) -> Result<GenerateSummary> {
        fs::create_dir_all(&self.site.public_dir)?;

        let mut summary = GenerateSummary::default();
        for path in self.static_paths().await? {
            match self.generate_post(&path.uid).await? {
                Some(_) => summary.generated.push(path.uid),
                None => {
                    tracing::warn!("{} was listed but could not be fetched", path.path);
                    summary.missing.push(path.uid);
                }
            }
        }

        Ok(summary)
    }
}

fn banner_tag(post: &Post) -> String {
    if post.banner.url.is_empty() {
        return String::new();
    }
    let alt = post.banner.alt.as_deref().unwrap_or("image");
    image_tag(&post.banner.url, Some(alt), Some("banner"))
}

fn loading_message(locale: Locale) -> &'static str {
    match locale {
        Locale::PtBr => "Carregando...",
        Locale::En => "Loading...",
    }
}

fn error_message(locale: Locale) -> &'static str {
    match locale {
        Locale::PtBr => "Não foi possível carregar este post. Tente novamente em instantes.",
        Locale::En => "This post could not be loaded. Please try again shortly.",
    }
}

fn not_found_message(locale: Locale) -> &'static str {
    match locale {
        Locale::PtBr => "Post não encontrado",
        Locale::En => "Post not found",
    }
}
