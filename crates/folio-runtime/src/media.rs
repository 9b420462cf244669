#![forbid(unsafe_code)]

//! Lazily mounted embedded media.
//!
//! A [`LazyMedia`] shows a placeholder until the oracle first reports its
//! region at or above the configured visible ratio. At that moment it flips
//! `loaded` permanently and hands exactly one [`MediaRequest`] to its
//! [`MediaSink`]. After loading it never unmounts; `visible` keeps tracking
//! later observations for hosts that want to pause offscreen playback.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use folio_core::event::RegionId;

use crate::reactive::Subscription;
use crate::visibility::{ObserveOptions, Visibility, VisibilityOracle};

/// Opaque media identifier (a video id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaId(String);

impl MediaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outbound request to fetch and mount an embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
    pub media: MediaId,
    pub url: String,
}

/// Receiver of outbound media requests.
pub trait MediaSink {
    fn request(&self, request: MediaRequest);
}

impl MediaSink for RefCell<Vec<MediaRequest>> {
    fn request(&self, request: MediaRequest) {
        self.borrow_mut().push(request);
    }
}

/// Lazy media tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaConfig {
    /// Minimum visible ratio that triggers loading.
    pub threshold: f64,
    /// Embed URL prefix; the media id is appended.
    pub embed_base: String,
    /// Placeholder hint shown before loading.
    pub placeholder: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            embed_base: "https://www.youtube.com/embed/".to_string(),
            placeholder: "SCROLL TO LOAD".to_string(),
        }
    }
}

impl MediaConfig {
    /// Autoplaying, muted, looping embed URL for `id`.
    #[must_use]
    pub fn embed_url(&self, id: &MediaId) -> String {
        format!(
            "{base}{id}?autoplay=1&mute=1&loop=1&playlist={id}",
            base = self.embed_base
        )
    }
}

/// What the host should render for a media slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaView {
    Placeholder { hint: String },
    Embed { src: String },
}

/// Observable flags of a lazy media slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaLazyState {
    pub visible: bool,
    pub loaded: bool,
}

struct Shared {
    state: MediaLazyState,
    src: Option<String>,
}

/// One lazily loaded embed.
pub struct LazyMedia {
    id: MediaId,
    region: RegionId,
    placeholder: String,
    shared: Rc<RefCell<Shared>>,
    _watch: Subscription,
}

impl std::fmt::Debug for LazyMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyMedia")
            .field("id", &self.id)
            .field("region", &self.region)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl LazyMedia {
    /// Start watching `region` on behalf of media `id`.
    pub fn mount(
        oracle: &dyn VisibilityOracle,
        region: RegionId,
        id: MediaId,
        config: &MediaConfig,
        sink: Rc<dyn MediaSink>,
    ) -> Self {
        let shared = Rc::new(RefCell::new(Shared {
            state: MediaLazyState::default(),
            src: None,
        }));
        let weak = Rc::downgrade(&shared);
        let request = MediaRequest {
            url: config.embed_url(&id),
            media: id.clone(),
        };
        let watch = oracle.observe(
            region,
            ObserveOptions::threshold(config.threshold),
            Box::new(move |vis| observe(&weak, vis, &request, sink.as_ref())),
        );
        Self {
            id,
            region,
            placeholder: config.placeholder.clone(),
            shared,
            _watch: watch,
        }
    }

    #[must_use]
    pub fn id(&self) -> &MediaId {
        &self.id
    }

    #[must_use]
    pub fn region(&self) -> RegionId {
        self.region
    }

    #[must_use]
    pub fn state(&self) -> MediaLazyState {
        self.shared.borrow().state
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state().loaded
    }

    /// Placeholder until loaded, then the embed.
    #[must_use]
    pub fn view(&self) -> MediaView {
        match &self.shared.borrow().src {
            Some(src) => MediaView::Embed { src: src.clone() },
            None => MediaView::Placeholder {
                hint: self.placeholder.clone(),
            },
        }
    }
}

fn observe(
    shared: &Weak<RefCell<Shared>>,
    vis: Visibility,
    request: &MediaRequest,
    sink: &dyn MediaSink,
) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    let load = {
        let mut s = shared.borrow_mut();
        s.state.visible = vis.visible;
        if vis.visible && !s.state.loaded {
            s.state.loaded = true;
            s.src = Some(request.url.clone());
            true
        } else {
            false
        }
    };
    if load {
        tracing::debug!(media = %request.media, ratio = vis.ratio, "media load requested");
        sink.request(request.clone());
    }
}
