//! ftui program driving a [`Controller`].
//!
//! ## ftui Model Contract
//!
//! `PortView` implements `ftui::Model`:
//! - `init()` issues the first refresh
//! - `update(msg)` hands the message to the controller and turns its [`Cmd`]
//!   into an ftui command
//! - `view(frame)` paints controller state via [`present::draw`]
//! - `subscriptions()` registers the refresh timer when an interval is set
//!
//! Refresh and terminate run as `Cmd::task_named` one-shots; each delivers
//! exactly one message back into `update()`. Terminal setup, raw-mode input
//! and teardown belong to `ftui::Program`.

use super::app::Controller;
use super::msg::{Cmd, Msg};
use crate::action::Terminator;
use crate::pipeline::Pipeline;
use crate::present;
use ftui::runtime::{Every, Subscription};
use ftui::{Cmd as FtuiCmd, Frame as FtuiFrame, Model as FtuiModel, Program, ProgramConfig};
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Subscription id of the refresh timer.
pub const REFRESH_TICK_ID: u64 = 0x5056_5449_434B;

/// Interactive port view.
pub struct PortView {
    controller: Controller,
    pipeline: Arc<Pipeline>,
    terminator: Arc<dyn Terminator>,
    refresh_interval: Option<Duration>,
}

impl PortView {
    pub fn new(controller: Controller, pipeline: Pipeline, terminator: Arc<dyn Terminator>) -> Self {
        Self {
            controller,
            pipeline: Arc::new(pipeline),
            terminator,
            refresh_interval: None,
        }
    }

    /// Refresh every `interval`; `None` refreshes only on request.
    pub fn with_refresh_interval(mut self, interval: Option<Duration>) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    fn dispatch(&self, cmd: Cmd) -> FtuiCmd<Msg> {
        match cmd {
            Cmd::None => FtuiCmd::none(),
            Cmd::Quit => FtuiCmd::quit(),
            Cmd::Refresh => {
                let pipeline = Arc::clone(&self.pipeline);
                FtuiCmd::task_named("refresh", move || refresh_task(&pipeline))
            }
            Cmd::Terminate { pid } => {
                let terminator = Arc::clone(&self.terminator);
                FtuiCmd::task_named("terminate", move || {
                    terminate_task(terminator.as_ref(), pid)
                })
            }
        }
    }
}

/// Body of the refresh task.
pub fn refresh_task(pipeline: &Pipeline) -> Msg {
    match pipeline.load() {
        Ok(snapshot) => Msg::DataLoaded(snapshot),
        Err(err) => Msg::OperationFailed(err),
    }
}

/// Body of the terminate task.
pub fn terminate_task(terminator: &dyn Terminator, pid: u32) -> Msg {
    match terminator.terminate(pid) {
        Ok(()) => Msg::TerminationSucceeded { pid },
        Err(err) => Msg::OperationFailed(err.into()),
    }
}

impl FtuiModel for PortView {
    type Message = Msg;

    fn init(&mut self) -> FtuiCmd<Self::Message> {
        tracing::info!(
            target: "pvw.view",
            read_only = self.controller.read_only(),
            refresh_interval = ?self.refresh_interval,
            "View initialized"
        );
        let cmd = self.controller.init();
        self.dispatch(cmd)
    }

    fn update(&mut self, msg: Self::Message) -> FtuiCmd<Self::Message> {
        let cmd = self.controller.update(msg);
        self.dispatch(cmd)
    }

    fn view(&self, frame: &mut FtuiFrame) {
        present::draw(frame, &self.controller, self.pipeline.schema());
    }

    fn subscriptions(&self) -> Vec<Box<dyn Subscription<Self::Message>>> {
        match self.refresh_interval {
            Some(interval) => vec![Box::new(Every::with_id(
                REFRESH_TICK_ID,
                interval,
                || Msg::Tick,
            ))],
            None => Vec::new(),
        }
    }
}

/// Run the view until the user quits.
pub fn run_view(view: PortView, config: ProgramConfig) -> io::Result<()> {
    let mut program =
        Program::with_config(view, config).map_err(|e| io::Error::other(e.to_string()))?;
    program.run().map_err(|e| io::Error::other(e.to_string()))
}
