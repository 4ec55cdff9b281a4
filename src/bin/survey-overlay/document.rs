//! First-page PDF rendering on a dedicated renderer thread.
//!
//! PDFium is bound once, inside the renderer thread, and every document is
//! opened and rasterised there. Requests and results travel over channels; a
//! result whose receiver has been dropped is discarded.

use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions};
use pdfium_render::prelude::*;
use std::sync::mpsc;
use std::thread;
use survey_overlay::ContentRef;
use thiserror::Error;

/// Errors that can occur when rendering a document.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("PDFium library unavailable: {0}")]
    Unavailable(String),
    #[error("failed to render '{name}': {source}")]
    Pdfium { name: String, source: PdfiumError },
    #[error("'{0}' has no pages")]
    Empty(String),
    #[error("render width {0} is out of range")]
    Width(u32),
    #[error("page of {width}x{height} px exceeds the maximum texture side of {max}")]
    TooLarge {
        width: u32,
        height: u32,
        max: usize,
    },
    #[error("renderer thread has stopped")]
    Stopped,
}

/// Rasterised first page ready for texture creation.
pub struct RenderedPage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub page_count: usize,
}

type RenderResult = Result<RenderedPage, RenderError>;

struct RenderJob {
    content: ContentRef,
    width: u32,
    max_side: usize,
    reply: mpsc::Sender<RenderResult>,
}

/// What an overlay's content area currently shows.
pub enum DocumentView {
    /// Waiting for the renderer thread.
    Loading(mpsc::Receiver<RenderResult>),
    Ready {
        texture: TextureHandle,
        page_count: usize,
        /// Page height divided by width
        aspect: f32,
    },
    /// Loading failed; the message is also logged.
    Failed(String),
}

impl DocumentView {
    /// Moves a loading view forward once its result has arrived.
    ///
    /// Pages larger than the GPU's maximum texture side fail instead of being
    /// uploaded.
    pub fn poll(&mut self, ctx: &egui::Context, texture_name: &str) {
        let Self::Loading(rx) = self else {
            return;
        };
        let max_side = ctx.input(|i| i.max_texture_side);
        let next = match rx.try_recv() {
            Ok(Ok(page))
                if page.width as usize > max_side || page.height as usize > max_side =>
            {
                let err = RenderError::TooLarge {
                    width: page.width,
                    height: page.height,
                    max: max_side,
                };
                log::warn!("{texture_name}: {err}");
                Self::Failed(err.to_string())
            }
            Ok(Ok(page)) => {
                let image = ColorImage::from_rgba_unmultiplied(
                    [page.width as usize, page.height as usize],
                    &page.pixels,
                );
                let texture = ctx.load_texture(texture_name, image, TextureOptions::LINEAR);
                Self::Ready {
                    texture,
                    page_count: page.page_count,
                    aspect: page.height as f32 / page.width.max(1) as f32,
                }
            }
            Ok(Err(err)) => {
                log::warn!("{texture_name}: {err}");
                Self::Failed(err.to_string())
            }
            Err(mpsc::TryRecvError::Disconnected) => {
                log::warn!("{texture_name}: {}", RenderError::Stopped);
                Self::Failed(RenderError::Stopped.to_string())
            }
            Err(mpsc::TryRecvError::Empty) => return,
        };
        *self = next;
    }

    pub fn page_count(&self) -> Option<usize> {
        match self {
            Self::Ready { page_count, .. } => Some(*page_count),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Handle to the renderer thread.
pub struct DocumentRenderer {
    jobs: Option<mpsc::Sender<RenderJob>>,
}

impl DocumentRenderer {
    pub fn spawn(ctx: egui::Context) -> Self {
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("pdf-renderer".to_owned())
            .spawn(move || run_renderer(rx, ctx));

        match spawned {
            Ok(_) => Self { jobs: Some(tx) },
            Err(err) => {
                log::error!("Failed to start renderer thread: {err}");
                Self { jobs: None }
            }
        }
    }

    /// Queues rendering of the first page of `content` at `width` pixels,
    /// scaled down so neither side exceeds `max_side`.
    pub fn request(&self, content: &ContentRef, width: u32, max_side: usize) -> DocumentView {
        let (reply, rx) = mpsc::channel();
        let job = RenderJob {
            content: content.clone(),
            width,
            max_side,
            reply,
        };
        // A failed send drops the reply sender, which the view reports as stopped.
        if let Some(jobs) = &self.jobs {
            let _ = jobs.send(job);
        }
        DocumentView::Loading(rx)
    }
}

fn bind_pdfium() -> Result<Pdfium, PdfiumError> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())?;
    Ok(Pdfium::new(bindings))
}

fn run_renderer(jobs: mpsc::Receiver<RenderJob>, ctx: egui::Context) {
    let pdfium = match bind_pdfium() {
        Ok(pdfium) => {
            log::info!("PDF renderer ready");
            Ok(pdfium)
        }
        Err(err) => {
            log::error!("Failed to bind PDFium: {err}");
            Err(err.to_string())
        }
    };

    for job in jobs {
        let result = match &pdfium {
            Ok(pdfium) => render_first_page(pdfium, &job.content, job.width, job.max_side),
            Err(msg) => Err(RenderError::Unavailable(msg.clone())),
        };
        if job.reply.send(result).is_err() {
            log::debug!(
                "Discarding render of {}: overlay was torn down",
                job.content.locator()
            );
        }
        ctx.request_repaint();
    }
}

fn render_first_page(
    pdfium: &Pdfium,
    content: &ContentRef,
    width: u32,
    max_side: usize,
) -> RenderResult {
    let target_width = i32::try_from(width).map_err(|_| RenderError::Width(width))?;
    let max_side = i32::try_from(max_side).unwrap_or(i32::MAX);
    let name = content.locator().to_owned();
    let pdfium_err = |source| RenderError::Pdfium {
        name: name.clone(),
        source,
    };

    let document = pdfium
        .load_pdf_from_byte_slice(content.bytes(), None)
        .map_err(pdfium_err)?;
    let pages = document.pages();
    let page_count = pages.len() as usize;
    let page = pages.first().map_err(|_| RenderError::Empty(name.clone()))?;

    let config = PdfRenderConfig::new()
        .set_target_width(target_width)
        .set_maximum_width(max_side)
        .set_maximum_height(max_side)
        .render_annotations(false)
        .render_form_data(false);
    let bitmap = page.render_with_config(&config).map_err(pdfium_err)?;

    Ok(RenderedPage {
        pixels: bitmap.as_rgba_bytes(),
        width: bitmap.width() as u32,
        height: bitmap.height() as u32,
        page_count,
    })
}
