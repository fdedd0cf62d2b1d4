use crate::tui::TuiMsg;
use crossterm::event;
use dirscout_scraper::RunEvent;
use std::time::Duration;
use tokio::sync::mpsc::{Sender, UnboundedReceiver};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::warn;

const TICK: Duration = Duration::from_millis(80);
const INPUT_POLL: Duration = Duration::from_millis(100);

/// Feed terminal input, redraw ticks and run events into the TUI mailbox
/// until `shutdown` is cancelled.
pub fn spawn_tui_feeders(
    tui: Sender<TuiMsg>,
    mut runs: UnboundedReceiver<RunEvent>,
    shutdown: CancellationToken,
) {
    let tui_in = tui.clone();
    let stop_input = shutdown.clone();
    tokio::task::spawn_blocking(move || {
        while !stop_input.is_cancelled() {
            match event::poll(INPUT_POLL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) => {
                    let _ = tui_in.blocking_send(TuiMsg::OpError(format!("input: {e}")));
                    break;
                }
            }
            let msg = match event::read() {
                Ok(ev) => TuiMsg::InputEvent(ev),
                Err(e) => TuiMsg::OpError(format!("input: {e}")),
            };
            if tui_in.blocking_send(msg).is_err() {
                break;
            }
        }
    });

    let tui_tick = tui.clone();
    let stop_tick = shutdown.clone();
    tokio::spawn(async move {
        let mut interval = time::interval(TICK);
        loop {
            tokio::select! {
                _ = stop_tick.cancelled() => break,
                _ = interval.tick() => {
                    let _ = tui_tick.try_send(TuiMsg::Tick);
                }
            }
        }
    });

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                ev = runs.recv() => match ev {
                    Some(ev) => {
                        if tui.send(TuiMsg::Run(ev)).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        warn!("run event channel closed");
                        break;
                    }
                },
            }
        }
    });
}
