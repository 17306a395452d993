use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use filedrop_core::{update, AppState, AppViewModel, Msg};
use filedrop_logging::filedrop_debug;

use crate::effects::EffectRunner;
use crate::render::{status_line, Renderer};
use crate::submission::{classify, into_messages};

/// How long the loop waits for engine events before ticking.
const TICK: Duration = Duration::from_millis(75);

/// Owns the queue state and is its only mutator. Submissions and engine
/// events are applied one message at a time.
pub struct App {
    state: AppState,
    runner: EffectRunner,
    renderer: Renderer,
    inbox: mpsc::Receiver<Msg>,
    input_open: bool,
    print: bool,
}

impl App {
    pub fn new(runner: EffectRunner, inbox: mpsc::Receiver<Msg>) -> Self {
        Self {
            state: AppState::new(),
            runner,
            renderer: Renderer::new(),
            inbox,
            input_open: true,
            print: true,
        }
    }

    #[cfg(test)]
    fn quiet(mut self) -> Self {
        self.print = false;
        self
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.run(effects);
    }

    /// Processes messages until no further progress is possible and the
    /// submission inbox is closed.
    pub fn run_until_settled(mut self) -> AppViewModel {
        loop {
            self.drain_inbox();
            match self.runner.next_msg(TICK) {
                Some(msg) => self.dispatch(msg),
                None => self.dispatch(Msg::Tick),
            }
            self.render();
            if !self.input_open && self.state.is_settled() {
                break;
            }
        }
        let view = self.state.view();
        if self.print {
            println!("{}", status_line(&view));
        }
        view
    }

    fn drain_inbox(&mut self) {
        while self.input_open {
            match self.inbox.try_recv() {
                Ok(msg) => self.dispatch(msg),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    filedrop_debug!("Submission input closed");
                    self.input_open = false;
                }
            }
        }
    }

    fn render(&mut self) {
        if !self.state.consume_dirty() {
            return;
        }
        let rows = self.renderer.changed_rows(&self.state.view());
        if self.print {
            for row in rows {
                println!("{row}");
            }
        }
    }
}

/// Feeds stdin lines into `tx` until end of input.
pub fn spawn_stdin_reader(tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let Some(submission) = classify(&line) else {
                continue;
            };
            for msg in into_messages(vec![submission]) {
                if tx.send(msg).is_err() {
                    return;
                }
            }
        }
    });
}
