//! # spark-fiber
//!
//! Incremental UI reconciliation for Rust.
//!
//! Describe the UI as an immutable [`Element`] tree, hand it to a
//! [`Renderer`], and let the scheduler turn it into host nodes a few fibers
//! at a time. Work pauses whenever the host's idle slice runs low and
//! resumes exactly where it stopped. Host mutations happen only in one
//! uninterrupted commit at the end of each cycle.
//!
//! ## Architecture
//!
//! ```text
//! Element tree ──render──▶ wip fiber tree ──work_loop──▶ effect tags ──commit──▶ host nodes
//!                               ▲                                          │
//!                               └──────── alternate (last committed) ◀─────┘
//! ```
//!
//! ## Modules
//!
//! - [`element`] - Elements, props, listeners and the `create_element` factory
//! - [`fiber`] - Fiber arena and the resumable pre-order traversal
//! - [`reconciler`] - Positional child diff producing effect tags
//! - [`scheduler`] - Render context, cooperative work loop and idle driving
//! - [`commit`] - Applies a finished tree to the host in one pass
//! - [`host`] - The adapter trait plus in-memory and terminal hosts
//! - [`config`] - Scheduler tuning
//!
//! ## Example
//!
//! ```ignore
//! use spark_fiber::{children, create_element, MemoryHost, Props, Renderer};
//!
//! let mut host = MemoryHost::new();
//! let container = host.create_container("root");
//! let mut renderer = Renderer::new(host);
//!
//! let app = create_element(
//!     "div",
//!     Props::new().set("id", "foo"),
//!     children![create_element("a", Props::new(), children!["bar"])],
//! );
//! renderer.render(app, container);
//! renderer.flush()?;
//!
//! assert_eq!(
//!     renderer.host().render_to_string(container),
//!     r#"<root><div id="foo"><a>bar</a></div></root>"#
//! );
//! ```

pub mod commit;
pub mod config;
pub mod element;
pub mod error;
pub mod fiber;
pub mod host;
pub mod reconciler;
pub mod scheduler;

pub use commit::{CommitReport, commit_root};
pub use config::SchedulerConfig;
pub use element::{Child, Element, Event, Listener, PropValue, Props, create_element, text};
pub use error::{Error, HostError, Result};
pub use fiber::{EffectTag, Fiber, FiberArena, FiberId};
pub use host::HostAdapter;
pub use host::memory::{MemoryHost, NodeId};
pub use host::terminal::TerminalHost;
pub use scheduler::{
    Deadline, IdleLoop, IdleScheduler, NoIdle, RenderCycle, Renderer, TimeBudget, Unbounded,
    WorkStatus,
};
