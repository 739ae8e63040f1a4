use std::{io::Write, sync::Arc};

use color_eyre::eyre::Result;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;

use crate::{
    domain::ProductId,
    infrastructure::{
        catalog_client::CatalogApi,
        config::Config,
        host::{PendingConfirm, TerminalHost},
    },
    model::catalog::{Catalog, Message},
    presentation::virtual_dom::VirtualDom,
};

use super::runtime::Runtime;

/// How a `:qty` line changes the dialog quantity
#[derive(Debug, Clone, PartialEq)]
pub enum QuantityInput {
    Step(i64),
    All,
    Exact(String),
}

/// One line of terminal input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Query(String),
    More,
    Scroll(f64),
    Open(ProductId),
    Quantity(QuantityInput),
    Confirm,
    Cancel,
    UpdateItem(ProductId, u32),
    DeleteItem(ProductId),
    Clear,
    Checkout,
    Refresh,
    Quit,
    Invalid(String),
}

/// Parse a terminal line; anything not starting with `:` is search input
pub fn parse_command(line: &str) -> Command {
    let Some(rest) = line.trim().strip_prefix(':') else {
        return Command::Query(line.trim().to_owned());
    };
    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();
    match (name, arg) {
        ("more", None) => Command::More,
        ("scroll", Some(ratio)) => match ratio.parse::<f64>() {
            Ok(ratio) if (0.0..=1.0).contains(&ratio) => Command::Scroll(ratio),
            _ => Command::Invalid(format!("scroll ratio must be within 0..1: {ratio}")),
        },
        ("open", Some(id)) => match id.parse::<i64>() {
            Ok(id) => Command::Open(ProductId(id)),
            Err(_) => Command::Invalid(format!("not a product id: {id}")),
        },
        ("qty", Some("all")) => Command::Quantity(QuantityInput::All),
        ("qty", Some(step)) if step.starts_with(['+', '-']) => match step.parse::<i64>() {
            Ok(delta) => Command::Quantity(QuantityInput::Step(delta)),
            Err(_) => Command::Invalid(format!("not a quantity step: {step}")),
        },
        ("qty", Some(value)) => Command::Quantity(QuantityInput::Exact(value.to_owned())),
        ("confirm", None) => Command::Confirm,
        ("cancel", None) => Command::Cancel,
        ("update", Some(id)) => match (id.parse::<i64>(), parts.next().map(str::parse::<u32>)) {
            (Ok(id), Some(Ok(quantity))) => Command::UpdateItem(ProductId(id), quantity),
            _ => Command::Invalid(String::from("usage: :update <product id> <quantity>")),
        },
        ("delete", Some(id)) => match id.parse::<i64>() {
            Ok(id) => Command::DeleteItem(ProductId(id)),
            Err(_) => Command::Invalid(format!("not a product id: {id}")),
        },
        ("clear", None) => Command::Clear,
        ("checkout", None) => Command::Checkout,
        ("refresh", None) => Command::Refresh,
        ("quit" | "q", None) => Command::Quit,
        _ => Command::Invalid(format!("unknown command: {}", line.trim())),
    }
}

/// Line-driven front end for the catalog
///
/// Reads commands and search input, dispatches them and prints the result
/// container as HTML whenever it changes. Host confirmations are answered by
/// the next input line.
pub struct AppRunner {
    runtime: Runtime<VirtualDom>,
    prompts: mpsc::UnboundedReceiver<PendingConfirm>,
    pending_confirm: Option<PendingConfirm>,
    cancel: CancellationToken,
    last_html: String,
}

impl AppRunner {
    pub fn new(config: &Config, api: Arc<dyn CatalogApi>, viewport: u32) -> Self {
        let (host, prompts) = TerminalHost::new();
        let cancel = CancellationToken::new();
        let catalog = Catalog::new(
            config.user_id,
            config.search.session_settings(),
            config.scroll.threshold,
        );
        let runtime = Runtime::new(
            catalog,
            VirtualDom::new(viewport),
            api,
            Arc::new(host),
            cancel.clone(),
        );
        Self {
            runtime,
            prompts,
            pending_confirm: None,
            cancel,
            last_html: String::new(),
        }
    }

    pub fn runtime(&self) -> &Runtime<VirtualDom> {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut Runtime<VirtualDom> {
        &mut self.runtime
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run on stdin and stdout until `:quit` or end of input
    pub async fn run(&mut self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = std::io::stdout();
        self.run_with(stdin, &mut stdout).await
    }

    pub async fn run_with<R, W>(&mut self, input: R, output: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        let cancel = self.cancel.clone();
        self.runtime.start();

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                line = lines.next_line() => match line? {
                    Some(line) => {
                        if !self.handle_line(&line) {
                            self.cancel.cancel();
                            break;
                        }
                    }
                    None => {
                        self.finish().await;
                        self.render(output)?;
                        break;
                    }
                },
                Some(message) = self.runtime.recv() => self.runtime.dispatch(message),
                Some(pending) = self.prompts.recv() => self.ask(pending),
            }
            self.render(output)?;
        }

        log::info!("Stopped after {:?}", self.runtime.stats());
        Ok(())
    }

    /// Apply one input line; `false` means the user asked to quit
    pub fn handle_line(&mut self, line: &str) -> bool {
        if let Some(pending) = self.pending_confirm.take() {
            let answer = TerminalHost::parse_answer(line);
            if pending.answer.send(answer).is_err() {
                log::debug!("Confirmation for {:?} is no longer awaited", pending.prompt);
            }
            return true;
        }

        match parse_command(line) {
            Command::Query(query) => self.runtime.submit_query(query),
            Command::More => self.runtime.load_more(),
            Command::Scroll(ratio) => self.runtime.scroll_ratio(ratio),
            Command::Open(id) => self.runtime.dispatch(Message::CardOpened(id)),
            Command::Quantity(QuantityInput::Step(delta)) => {
                self.runtime.dispatch(Message::QuantityStepped(delta));
            }
            Command::Quantity(QuantityInput::All) => {
                self.runtime.dispatch(Message::AllAvailableSelected);
            }
            Command::Quantity(QuantityInput::Exact(value)) => {
                self.runtime.dispatch(Message::CustomQuantityEntered(value));
            }
            Command::Confirm => self.runtime.dispatch(Message::ReservationConfirmed),
            Command::Cancel => self.runtime.dispatch(Message::ReservationCancelled),
            Command::UpdateItem(id, quantity) => self.runtime.update_item(id, quantity),
            Command::DeleteItem(id) => self.runtime.delete_item(id),
            Command::Clear => self.runtime.dispatch(Message::ClearListRequested),
            Command::Checkout => self.runtime.dispatch(Message::CheckoutRequested),
            Command::Refresh => self.runtime.refresh(),
            Command::Quit => return false,
            Command::Invalid(reason) => {
                log::warn!("Ignoring input: {reason}");
                eprintln!("{reason}");
            }
        }
        true
    }

    fn ask(&mut self, pending: PendingConfirm) {
        eprintln!("{} [y/N]", pending.prompt);
        // A newer prompt supersedes an unanswered one, which is declined
        self.pending_confirm = Some(pending);
    }

    /// Drain outstanding work once input is exhausted
    async fn finish(&mut self) {
        self.prompts.close();
        self.pending_confirm = None;
        while self.prompts.try_recv().is_ok() {}
        self.runtime.run_until_idle().await;
    }

    fn render<W: Write>(&mut self, output: &mut W) -> Result<()> {
        let html = self.runtime.view().to_html();
        if html != self.last_html {
            writeln!(output, "{html}")?;
            output.flush()?;
            self.last_html = html;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{page, product, FakeCatalog};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("bolt", Command::Query("bolt".into()))]
    #[case("  nut ", Command::Query("nut".into()))]
    #[case(":more", Command::More)]
    #[case(":scroll 0.5", Command::Scroll(0.5))]
    #[case(":scroll 2", Command::Invalid("scroll ratio must be within 0..1: 2".into()))]
    #[case(":open 42", Command::Open(ProductId(42)))]
    #[case(":open x", Command::Invalid("not a product id: x".into()))]
    #[case(":qty +2", Command::Quantity(QuantityInput::Step(2)))]
    #[case(":qty -1", Command::Quantity(QuantityInput::Step(-1)))]
    #[case(":qty all", Command::Quantity(QuantityInput::All))]
    #[case(":qty 7", Command::Quantity(QuantityInput::Exact("7".into())))]
    #[case(":confirm", Command::Confirm)]
    #[case(":cancel", Command::Cancel)]
    #[case(":update 3 4", Command::UpdateItem(ProductId(3), 4))]
    #[case(":update 3", Command::Invalid("usage: :update <product id> <quantity>".into()))]
    #[case(":update 3 -1", Command::Invalid("usage: :update <product id> <quantity>".into()))]
    #[case(":delete 3", Command::DeleteItem(ProductId(3)))]
    #[case(":clear", Command::Clear)]
    #[case(":checkout", Command::Checkout)]
    #[case(":refresh", Command::Refresh)]
    #[case(":quit", Command::Quit)]
    #[case(":fly", Command::Invalid("unknown command: :fly".into()))]
    fn test_parse_command(#[case] line: &str, #[case] expected: Command) {
        assert_eq!(parse_command(line), expected);
    }

    fn config() -> Config {
        let mut config = Config::embedded().expect("embedded config");
        config.user_id = 7;
        config
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_from_input_is_rendered() {
        let catalog =
            FakeCatalog::new().with_page("bolt", 0, page(vec![product(1, "A")], false));
        let mut runner = AppRunner::new(&config(), Arc::new(catalog), 720);
        let mut output = Vec::new();

        runner
            .run_with(&b"bolt\n"[..], &mut output)
            .await
            .expect("runner finished");

        let printed = String::from_utf8(output).expect("utf-8 output");
        assert!(printed.contains(r#"data-product-id="1""#));
        assert_eq!(runner.runtime().view().visible_ids(), vec![ProductId(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quit_stops_before_end_of_input() {
        let catalog = FakeCatalog::new();
        let mut runner = AppRunner::new(&config(), Arc::new(catalog.clone()), 720);
        let mut output = Vec::new();

        runner
            .run_with(&b":quit\nbolt\n"[..], &mut output)
            .await
            .expect("runner finished");

        assert!(runner.cancel_token().is_cancelled());
        assert!(catalog.search_calls().is_empty());
    }
}
