///! Line-oriented reviewing front end
///!
///! Each input line is a key combination (dispatched through the binding
///! table) or a slash command. Rank keys only fill a pending rank; submit and
///! the navigation keys commit it.
use anyhow::Context;
use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use astrorank_core::config::AppConfig;
use astrorank_core::coords::parse_coordinates;
use astrorank_core::keys::{Action, Binding, KeyBindings, KeyCombo};
use astrorank_core::secondary::{FetchEvent, FetchOutcome, FetchState, SecondaryManager};
use astrorank_core::session::Session;
use astrorank_core::store::Rank;

use crate::command::{CommandType, Input, ParsedCommand};

const ZOOM_STEP: f64 = 1.1;

/// Whether the loop should keep reading input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Display preferences; they only affect what gets printed
#[derive(Debug, Clone)]
struct ViewState {
    zoom: f64,
    list_visible: bool,
    dark: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            list_visible: false,
            dark: false,
        }
    }
}

pub struct Console<W: Write> {
    session: Session,
    bindings: KeyBindings,
    manager: SecondaryManager,
    config: AppConfig,
    pending: Option<Rank>,
    awaiting_comment: bool,
    view: ViewState,
    launch_browser: bool,
    out: W,
}

impl<W: Write> Console<W> {
    pub fn new(
        session: Session,
        bindings: KeyBindings,
        manager: SecondaryManager,
        config: AppConfig,
        out: W,
    ) -> Self {
        Self {
            session,
            bindings,
            manager,
            config,
            pending: None,
            awaiting_comment: false,
            view: ViewState::default(),
            launch_browser: false,
            out,
        }
    }

    /// Hand browser URLs to the desktop's opener in addition to printing them
    pub fn with_browser_launch(mut self, enabled: bool) -> Self {
        self.launch_browser = enabled;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn pending(&self) -> Option<&Rank> {
        self.pending.as_ref()
    }

    pub fn prompt(&mut self) -> io::Result<()> {
        if self.awaiting_comment {
            write!(self.out, "comment> ")?;
        } else {
            write!(self.out, "> ")?;
        }
        self.out.flush()
    }

    /// Print the current image with its rank and comment
    pub fn show_current(&mut self) -> io::Result<()> {
        let id = self.session.current().to_string();
        let rank = self
            .session
            .rank_of(&id)
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            self.out,
            "[{}/{}] {}  rank: {}",
            self.session.index() + 1,
            self.session.len(),
            self.session.current_path().display(),
            rank
        )?;
        if let Some(comment) = self.session.comment_of(&id) {
            writeln!(self.out, "    comment: {}", comment)?;
        }
        Ok(())
    }

    /// Process one line of input
    pub async fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        if self.awaiting_comment {
            self.awaiting_comment = false;
            self.apply_comment(line)?;
            return Ok(Flow::Continue);
        }

        match Input::parse(line) {
            Input::Empty => self.dispatch(Action::Submit).await,
            Input::Command(command) => self.run_command(command).await,
            Input::Key(combo) => self.handle_key(&combo).await,
            Input::Unrecognized(text) => {
                writeln!(self.out, "Unknown key '{}', type ? or /help", text)?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn handle_key(&mut self, combo: &KeyCombo) -> io::Result<Flow> {
        match self.bindings.lookup(combo).cloned() {
            Some(Binding::Rank(rank)) => {
                writeln!(self.out, "rank {} pending (enter to submit)", rank)?;
                self.pending = Some(rank);
                Ok(Flow::Continue)
            }
            Some(Binding::Action(action)) => self.dispatch(action).await,
            None => {
                writeln!(self.out, "Key '{}' is not bound", combo)?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Submit the pending rank, if any. Returns whether one was pending.
    fn commit_pending(&mut self) -> io::Result<bool> {
        let Some(rank) = self.pending.take() else {
            return Ok(false);
        };
        match self.session.submit_rank(rank.clone()) {
            Ok(()) => writeln!(self.out, "ranked {} as {}", self.session.current(), rank)?,
            Err(e) => writeln!(self.out, "error: {}", e)?,
        }
        Ok(true)
    }

    async fn dispatch(&mut self, action: Action) -> io::Result<Flow> {
        match action {
            Action::Quit => return Ok(Flow::Quit),
            Action::ClearInput => {
                self.pending = None;
                writeln!(self.out, "input cleared")?;
            }
            Action::ClearRank => match self.session.clear_rank() {
                Ok(true) => {
                    writeln!(self.out, "rank cleared")?;
                    self.show_current()?;
                }
                Ok(false) => writeln!(self.out, "not ranked")?,
                Err(e) => writeln!(self.out, "error: {}", e)?,
            },
            Action::Fit => {
                self.view.zoom = 1.0;
                writeln!(self.out, "zoom 100%")?;
            }
            Action::ZoomIn | Action::ZoomOut => {
                if action == Action::ZoomIn {
                    self.view.zoom *= ZOOM_STEP;
                } else {
                    self.view.zoom /= ZOOM_STEP;
                }
                writeln!(self.out, "zoom {:.0}%", self.view.zoom * 100.0)?;
            }
            Action::Help => self.print_help()?,
            Action::ToggleList => {
                self.view.list_visible = !self.view.list_visible;
                if self.view.list_visible {
                    self.print_list()?;
                } else {
                    writeln!(self.out, "list hidden")?;
                }
            }
            Action::ToggleDark => {
                self.view.dark = !self.view.dark;
                writeln!(
                    self.out,
                    "dark mode {}",
                    if self.view.dark { "on" } else { "off" }
                )?;
            }
            Action::Comment => {
                let current = self.session.comment_of(self.session.current()).unwrap_or("");
                writeln!(
                    self.out,
                    "comment for {} (current: '{}', empty line removes):",
                    self.session.current(),
                    current
                )?;
                self.awaiting_comment = true;
            }
            Action::Submit | Action::Next => {
                self.commit_pending()?;
                if !self.navigation_held().await? {
                    self.session.next();
                }
                self.show_current()?;
            }
            Action::Previous => {
                self.commit_pending()?;
                if !self.navigation_held().await? {
                    self.session.previous();
                }
                self.show_current()?;
            }
            Action::First => {
                if !self.commit_pending()? && !self.navigation_held().await? {
                    self.session.first();
                }
                self.show_current()?;
            }
            Action::SkipUnranked => {
                if !self.commit_pending()?
                    && !self.navigation_held().await?
                    && !self.session.skip_to_next_unranked()
                {
                    writeln!(self.out, "All images have been ranked!")?;
                }
                self.show_current()?;
            }
            Action::FetchSecondary => self.fetch_secondary().await?,
            Action::OpenBrowser => self.open_browser()?,
        }
        Ok(Flow::Continue)
    }

    async fn run_command(&mut self, command: ParsedCommand) -> io::Result<Flow> {
        match command.command_type {
            CommandType::Rank => {
                self.pending = None;
                match self.session.submit_input(&command.arguments) {
                    Ok(rank) => {
                        writeln!(self.out, "ranked {} as {}", self.session.current(), rank)?;
                        if !self.navigation_held().await? {
                            self.session.next();
                        }
                        self.show_current()?;
                    }
                    Err(e) => writeln!(self.out, "error: {}", e)?,
                }
            }
            CommandType::Comment => self.apply_comment(&command.arguments)?,
            CommandType::Goto => {
                if !self.navigation_held().await? {
                    self.goto(&command.arguments)?;
                }
            }
            CommandType::Status => self.print_status()?,
            CommandType::Help => self.print_help()?,
            CommandType::Quit => return Ok(Flow::Quit),
            CommandType::Unknown => {
                writeln!(self.out, "Unknown command '{}'", command.raw_text)?;
            }
        }
        Ok(Flow::Continue)
    }

    fn apply_comment(&mut self, text: &str) -> io::Result<()> {
        self.session.set_comment(text);
        match self.session.comment_of(self.session.current()) {
            Some(comment) => writeln!(self.out, "comment set: {}", comment),
            None => writeln!(self.out, "comment removed"),
        }
    }

    /// Navigation waits while the displayed image's secondary fetch runs, so
    /// returning to it cannot race a second fetch
    async fn navigation_held(&mut self) -> io::Result<bool> {
        let id = self.session.current().to_string();
        if self.manager.state(&id).await != FetchState::Fetching {
            return Ok(false);
        }
        writeln!(
            self.out,
            "{} image for {} is still being fetched; navigation resumes when it finishes",
            self.config.secondary_download.name, id
        )?;
        Ok(true)
    }

    fn goto(&mut self, target: &str) -> io::Result<()> {
        let index = match target.parse::<usize>() {
            Ok(n) => n.checked_sub(1),
            Err(_) => self.session.ids().iter().position(|id| id == target),
        };
        match index {
            Some(i) if self.session.go_to(i) => self.show_current(),
            _ => writeln!(self.out, "No image '{}'", target),
        }
    }

    async fn fetch_secondary(&mut self) -> io::Result<()> {
        let id = self.session.current().to_string();
        match self.manager.request(&id).await {
            FetchOutcome::Started => {
                writeln!(
                    self.out,
                    "fetching {} image for {}...",
                    self.config.secondary_download.name, id
                )?;
                if let Some(coords) = parse_coordinates(&id) {
                    let url = self.config.secondary_download.viewer_url(&coords);
                    writeln!(self.out, "  viewer: {}", url)?;
                }
                Ok(())
            }
            FetchOutcome::AlreadyFetching => writeln!(self.out, "already fetching {}", id),
            FetchOutcome::Cached(path) => writeln!(self.out, "secondary image: {}", path.display()),
            FetchOutcome::NoCoordinates => writeln!(self.out, "no coordinates in '{}'", id),
            FetchOutcome::Disabled => writeln!(self.out, "secondary download is disabled"),
        }
    }

    fn open_browser(&mut self) -> io::Result<()> {
        let id = self.session.current().to_string();
        let Some(coords) = parse_coordinates(&id) else {
            return writeln!(self.out, "no coordinates in '{}'", id);
        };
        let Some(url) = self.config.browser_url(&coords) else {
            return writeln!(self.out, "browser links are disabled");
        };
        writeln!(self.out, "{}", url)?;
        if self.launch_browser {
            if let Err(e) = launch(&url) {
                warn!("Failed to open browser: {}", e);
            }
        }
        Ok(())
    }

    /// Render a fetch notification
    pub fn handle_event(&mut self, event: &FetchEvent) -> io::Result<()> {
        match event {
            FetchEvent::Progress {
                identifier,
                percent,
            } => writeln!(self.out, "  {} {}%", identifier, percent),
            FetchEvent::Succeeded { identifier, path } => writeln!(
                self.out,
                "secondary image for {} ready: {}",
                identifier,
                path.display()
            ),
            FetchEvent::Failed { identifier, error } => {
                writeln!(self.out, "secondary image for {} failed: {}", identifier, error)
            }
        }
    }

    fn print_status(&mut self) -> io::Result<()> {
        let ranked = self.session.ranked_count();
        writeln!(
            self.out,
            "{}/{} ranked, {} unsaved, output {}",
            ranked,
            self.session.len(),
            self.session.unsaved(),
            self.session.output().display()
        )?;
        writeln!(self.out, "ranks: {}", self.session.scale().describe())
    }

    fn print_list(&mut self) -> io::Result<()> {
        for (i, id) in self.session.ids().iter().enumerate() {
            let marker = if i == self.session.index() { '>' } else { ' ' };
            let rank = self
                .session
                .rank_of(id)
                .map(|r| r.to_string())
                .unwrap_or_default();
            let comment = self.session.comment_of(id).unwrap_or_default();
            writeln!(self.out, "{} {:>5} {:<40} {:>4} {}", marker, i + 1, id, rank, comment)?;
        }
        Ok(())
    }

    fn print_help(&mut self) -> io::Result<()> {
        writeln!(self.out, "ranks: {}", self.session.scale().describe())?;
        for line in self.bindings.help_lines() {
            writeln!(self.out, "  {}", line)?;
        }
        writeln!(
            self.out,
            "commands: /rank <v>, /comment [text], /goto <n|name>, /status, /help, /quit"
        )
    }

    /// Final save
    pub fn close(&mut self) -> anyhow::Result<()> {
        self.session
            .close()
            .context("Failed to save rankings on exit")
    }
}

fn launch(url: &str) -> io::Result<()> {
    let mut command = if cfg!(target_os = "macos") {
        std::process::Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        std::process::Command::new("xdg-open")
    };
    command.arg(url).spawn().map(|_| ())
}

/// Read stdin until quit, EOF or Ctrl-C, rendering fetch events as they
/// arrive; always finishes with a save.
pub async fn run<W: Write>(
    console: Console<W>,
    events: mpsc::UnboundedReceiver<FetchEvent>,
) -> anyhow::Result<()> {
    run_with_input(console, events, BufReader::new(tokio::io::stdin())).await
}

/// Drive the session from `input`. The final save runs even when the loop
/// fails; the loop's error is reported first.
pub async fn run_with_input<W, R>(
    mut console: Console<W>,
    mut events: mpsc::UnboundedReceiver<FetchEvent>,
    mut input: R,
) -> anyhow::Result<()>
where
    W: Write,
    R: AsyncBufRead + Unpin,
{
    let outcome = read_loop(&mut console, &mut events, &mut input).await;
    let closed = console.close();

    match (outcome, closed) {
        (Ok(()), closed) => closed,
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            error!("{:#}", close_err);
            Err(e)
        }
    }
}

async fn read_loop<W, R>(
    console: &mut Console<W>,
    events: &mut mpsc::UnboundedReceiver<FetchEvent>,
    input: &mut R,
) -> anyhow::Result<()>
where
    W: Write,
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();

    console.show_current()?;
    loop {
        console.prompt()?;
        tokio::select! {
            read = input.read_until(b'\n', &mut buf) => {
                if read.context("Failed to read input")? == 0 {
                    info!("End of input");
                    break;
                }
                let line = String::from_utf8_lossy(&buf).into_owned();
                buf.clear();
                let line = line.trim_end_matches(['\n', '\r']);
                if console.handle_line(line).await? == Flow::Quit {
                    info!("Quit requested");
                    break;
                }
            }
            Some(event) = events.recv() => {
                writeln!(console.out)?;
                console.handle_event(&event)?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                writeln!(console.out)?;
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use astrorank_core::secondary::{HttpRasterSource, RasterSource};
    use async_trait::async_trait;
    use std::pin::Pin;
    use std::task::{Context as TaskContext, Poll};
    use tokio::io::{AsyncRead, ReadBuf};
    use astrorank_core::store::{comments_path, RankScale, RankingStore};
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        output: PathBuf,
        console: Console<Vec<u8>>,
    }

    fn fixture(names: &[&str]) -> Fixture {
        let mut config = AppConfig::default();
        config.secondary_download.enabled = false;
        let source = Arc::new(HttpRasterSource::new(Duration::from_secs(1)).unwrap());
        fixture_with(names, config, source)
    }

    fn fixture_with(names: &[&str], config: AppConfig, source: Arc<dyn RasterSource>) -> Fixture {
        let tmp = TempDir::new().unwrap();
        let images = tmp.path().join("images");
        fs::create_dir(&images).unwrap();
        for name in names {
            fs::write(images.join(name), b"").unwrap();
        }
        let output = tmp.path().join("rankings.txt");

        let session = Session::open(&images, &output, config.rank_scale(), config.save_every()).unwrap();
        let bindings = KeyBindings::new(session.scale(), &config.keys);
        let (tx, _rx) = mpsc::unbounded_channel();
        let manager = SecondaryManager::new(&config, &images, source, tx);
        let console = Console::new(session, bindings, manager, config, Vec::new());
        Fixture {
            _tmp: tmp,
            output,
            console,
        }
    }

    fn printed(console: &Console<Vec<u8>>) -> String {
        String::from_utf8_lossy(console.writer()).into_owned()
    }

    #[tokio::test]
    async fn test_rank_key_then_enter() {
        let mut f = fixture(&["a.jpg", "b.jpg", "c.jpg"]);
        f.console.handle_line("2").await.unwrap();
        assert_eq!(f.console.pending(), Some(&Rank::Int(2)));
        assert_eq!(f.console.session().rank_of("a.jpg"), None);

        f.console.handle_line("").await.unwrap();
        assert_eq!(f.console.pending(), None);
        assert_eq!(f.console.session().rank_of("a.jpg"), Some(&Rank::Int(2)));
        assert_eq!(f.console.session().current(), "b.jpg");
    }

    #[tokio::test]
    async fn test_arrow_commits_pending() {
        let mut f = fixture(&["a.jpg", "b.jpg"]);
        f.console.handle_line("`").await.unwrap();
        f.console.handle_line("right").await.unwrap();
        assert_eq!(f.console.session().rank_of("a.jpg"), Some(&Rank::Int(0)));
        assert_eq!(f.console.session().current(), "b.jpg");

        f.console.handle_line("left").await.unwrap();
        assert_eq!(f.console.session().current(), "a.jpg");
    }

    #[tokio::test]
    async fn test_shift_right_with_pending_only_submits() {
        let mut f = fixture(&["a.jpg", "b.jpg", "c.jpg"]);
        f.console.handle_line("1").await.unwrap();
        f.console.handle_line("shift+right").await.unwrap();
        assert_eq!(f.console.session().current(), "a.jpg");
        assert!(f.console.session().rank_of("a.jpg").is_some());

        f.console.handle_line("shift+right").await.unwrap();
        assert_eq!(f.console.session().current(), "b.jpg");
    }

    #[tokio::test]
    async fn test_clear_input_and_rank() {
        let mut f = fixture(&["a.jpg", "b.jpg"]);
        f.console.handle_line("3").await.unwrap();
        f.console.handle_line("backspace").await.unwrap();
        assert_eq!(f.console.pending(), None);

        f.console.handle_line("/rank 3").await.unwrap();
        f.console.handle_line("left").await.unwrap();
        f.console.handle_line("c").await.unwrap();
        assert_eq!(f.console.session().rank_of("a.jpg"), None);
        assert!(f.output.exists());
    }

    #[tokio::test]
    async fn test_invalid_rank_command_is_reported() {
        let mut f = fixture(&["a.jpg"]);
        f.console.handle_line("/rank 7").await.unwrap();
        assert!(printed(&f.console).contains("invalid rank '7'"));
        assert_eq!(f.console.session().ranked_count(), 0);
    }

    #[tokio::test]
    async fn test_comment_flow_and_quit_saves() {
        let mut f = fixture(&["a.jpg", "b.jpg"]);
        f.console.handle_line("k").await.unwrap();
        f.console.handle_line("looks like a lens").await.unwrap();
        assert_eq!(
            f.console.session().comment_of("a.jpg"),
            Some("looks like a lens")
        );

        f.console.handle_line("/comment").await.unwrap();
        assert_eq!(f.console.session().comment_of("a.jpg"), None);
        f.console.handle_line("/comment edge-on").await.unwrap();

        assert_eq!(f.console.handle_line("q").await.unwrap(), Flow::Quit);
        f.console.close().unwrap();
        let comments = astrorank_core::store::CommentStore::load(comments_path(&f.output));
        assert_eq!(comments.get("a.jpg"), Some("edge-on"));
    }

    #[tokio::test]
    async fn test_goto_and_status() {
        let mut f = fixture(&["a.jpg", "b.jpg", "c.jpg"]);
        f.console.handle_line("/goto 3").await.unwrap();
        assert_eq!(f.console.session().current(), "c.jpg");
        f.console.handle_line("/goto b.jpg").await.unwrap();
        assert_eq!(f.console.session().current(), "b.jpg");
        f.console.handle_line("/goto 0").await.unwrap();
        assert_eq!(f.console.session().current(), "b.jpg");

        f.console.handle_line("/status").await.unwrap();
        assert!(printed(&f.console).contains("0/3 ranked"));
    }

    #[tokio::test]
    async fn test_secondary_disabled_and_browser_link() {
        let mut f = fixture(&["src_100.00371_-69.056759.jpg"]);
        f.console.handle_line("w").await.unwrap();
        f.console.handle_line("b").await.unwrap();
        let out = printed(&f.console);
        assert!(out.contains("secondary download is disabled"));
        assert!(out.contains("ra=100.00371&dec=-69.056759"));
    }

    #[tokio::test]
    async fn test_close_persists_batch() {
        let mut f = fixture(&["a.jpg", "b.jpg", "c.jpg"]);
        for _ in 0..3 {
            f.console.handle_line("2").await.unwrap();
            f.console.handle_line("enter").await.unwrap();
        }
        assert!(!f.output.exists());
        f.console.close().unwrap();
        assert_eq!(RankingStore::load(&f.output, RankScale::default()).len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_event_rendering() {
        let mut f = fixture(&["a.jpg"]);
        f.console
            .handle_event(&FetchEvent::Failed {
                identifier: "a.jpg".to_string(),
                error: "fetch failed: timeout after 30s".to_string(),
            })
            .unwrap();
        assert!(printed(&f.console).contains("a.jpg failed: fetch failed: timeout after 30s"));
    }

    /// Never answers, so a fetch stays in flight for the whole test
    struct StalledSource;

    #[async_trait]
    impl RasterSource for StalledSource {
        async fn fetch(&self, _url: &str) -> astrorank_core::Result<Vec<u8>> {
            std::future::pending().await
        }
    }

    /// Input stream that fails on the first read
    struct BrokenInput;

    impl AsyncRead for BrokenInput {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut TaskContext<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::other("terminal went away")))
        }
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_keeps_session_and_saves() {
        let f = fixture(&["a.jpg", "b.jpg", "c.jpg"]);
        let (_tx, rx) = mpsc::unbounded_channel();
        let input: &[u8] = b"1\n\n2\n\n\xff\xfe\n";

        run_with_input(f.console, rx, BufReader::new(input))
            .await
            .unwrap();

        let content = fs::read_to_string(&f.output).unwrap();
        assert_eq!(content, "a.jpg\t1\nb.jpg\t2\nc.jpg\t\n");
    }

    #[tokio::test]
    async fn test_read_error_still_saves() {
        let mut f = fixture(&["a.jpg", "b.jpg"]);
        f.console.handle_line("3").await.unwrap();
        f.console.handle_line("").await.unwrap();
        assert!(!f.output.exists());

        let (_tx, rx) = mpsc::unbounded_channel();
        let result = run_with_input(f.console, rx, BufReader::new(BrokenInput)).await;
        assert!(result.is_err());
        assert_eq!(
            RankingStore::load(&f.output, RankScale::default()).get("a.jpg"),
            Some(&Rank::Int(3))
        );
    }

    #[tokio::test]
    async fn test_navigation_held_while_current_fetch_runs() {
        let config = AppConfig::default();
        let mut f = fixture_with(
            &["src_10.0_20.0.jpg", "src_11.0_20.0.jpg"],
            config,
            Arc::new(StalledSource),
        );

        f.console.handle_line("w").await.unwrap();
        f.console.handle_line("2").await.unwrap();
        f.console.handle_line("right").await.unwrap();
        assert_eq!(f.console.session().current(), "src_10.0_20.0.jpg");
        assert_eq!(
            f.console.session().rank_of("src_10.0_20.0.jpg"),
            Some(&Rank::Int(2))
        );
        f.console.handle_line("/goto 2").await.unwrap();
        assert_eq!(f.console.session().current(), "src_10.0_20.0.jpg");
        assert!(printed(&f.console).contains("still being fetched"));

        assert_eq!(f.console.handle_line("q").await.unwrap(), Flow::Quit);
    }
}
