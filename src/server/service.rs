//! The admin API service: accept loop, per-tick pump, and teardown.

use crate::{
    api::router::{RequestCx, Router},
    game::GameServer,
    http::{
        request::{BodyReader, ParsedRequest},
        response::{self, Outcome},
    },
    limits::ApiLimits,
    server::{
        handoff::{self, Collector, Polled, Publisher},
        transport::{self, Exchange, HttpAcceptor, HttpExchange, RequestHead},
    },
};
use std::{
    io,
    net::SocketAddr,
    sync::Arc,
    thread::{self, JoinHandle},
};

/// The embedded web administration service.
///
/// One thread blocks on the listener and feeds requests through a
/// single-slot handoff; the owner drives [`WebRcon::frame`] from its
/// simulation tick to serve them. All handler code runs on the caller's
/// thread, so simulation state needs no locking.
///
/// ```no_run
/// use webrcon::{ApiLimits, WebRcon};
/// # fn tick(_: &mut dyn webrcon::GameServer) -> bool { false }
/// # fn main() -> std::io::Result<()> {
/// # let mut game: Box<dyn webrcon::GameServer> = unimplemented!();
/// let mut api = WebRcon::bind("127.0.0.1:8080".parse().unwrap(), ApiLimits::default())?;
///
/// while tick(game.as_mut()) {
///     api.frame(game.as_mut());
/// }
/// api.shutdown();
/// # Ok(())
/// # }
/// ```
pub struct WebRcon {
    collector: Collector<Box<dyn Exchange>>,
    acceptor: Arc<HttpAcceptor>,
    accept_thread: Option<JoinHandle<()>>,
    router: Router,
    limits: ApiLimits,
    down: bool,
}

impl WebRcon {
    /// Binds `addr` and starts the accept thread.
    pub fn bind(addr: SocketAddr, limits: ApiLimits) -> io::Result<Self> {
        let acceptor = Arc::new(HttpAcceptor::bind(addr, limits.backlog)?);
        let (publisher, collector) = handoff::pair();

        let accept_thread = thread::Builder::new().name("webrcon-accept".to_owned()).spawn({
            let acceptor = acceptor.clone();
            let limits = limits.clone();
            move || accept_loop(&acceptor, publisher, &limits)
        })?;

        tracing::info!(addr = %acceptor.local_addr(), "admin API listening");

        Ok(Self {
            collector,
            acceptor,
            accept_thread: Some(accept_thread),
            router: Router::new(),
            limits,
            down: false,
        })
    }

    /// The address the listener actually bound, for port-0 binds.
    pub fn local_addr(&self) -> SocketAddr {
        self.acceptor.local_addr()
    }

    /// Serves at most one pending request. Call once per simulation
    /// tick; returns immediately when nothing is waiting.
    pub fn frame(&mut self, game: &mut dyn GameServer) {
        if self.down {
            return;
        }

        match self.collector.poll() {
            Polled::Empty => {}
            Polled::Request(mut delivery) => {
                let exchange = delivery.value_mut().as_mut();
                let outcome = self.serve(exchange, game);
                if let Err(err) = response::write(outcome, exchange) {
                    tracing::warn!(error = %err, "failed to write a response");
                }
                delivery.finish();
            }
            Polled::Disconnected => {
                tracing::error!("accept thread is gone; stopping the admin API");
                self.shutdown();
            }
        }
    }

    fn serve(&self, exchange: &mut dyn Exchange, game: &mut dyn GameServer) -> Outcome {
        let (Some(method), Some(path)) = (exchange.method(), exchange.path()) else {
            return Outcome::bad_request("Incomplete request line.");
        };
        let (method, path) = (method.to_owned(), path.to_owned());
        let query = exchange.query().to_owned();

        let req = match ParsedRequest::parse(&method, &path, &query) {
            Ok(req) => req,
            Err(err) => return Outcome::bad_request(err.to_string()),
        };
        tracing::debug!(%method, %path, "dispatching admin request");

        let mut cx = RequestCx {
            req: &req,
            body: BodyReader::new(exchange, self.limits.body_size),
            game,
        };
        self.router.dispatch(&mut cx)
    }

    /// Stops the listener and joins the accept thread.
    ///
    /// The handoff is shut down before the listener is interrupted, so a
    /// producer blocked on an unserved request is released first and the
    /// join cannot deadlock. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.down {
            return;
        }
        self.down = true;

        self.collector.shutdown();
        self.acceptor.interrupt();
        if let Some(handle) = self.accept_thread.take() {
            if handle.join().is_err() {
                tracing::error!("accept thread panicked");
            }
        }

        tracing::info!("admin API stopped");
    }
}

impl Drop for WebRcon {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn accept_loop(
    acceptor: &HttpAcceptor,
    publisher: Publisher<Box<dyn Exchange>>,
    limits: &ApiLimits,
) {
    loop {
        let mut stream = match acceptor.accept() {
            Ok(stream) => stream,
            Err(err) => {
                if acceptor.is_stopping() {
                    return;
                }
                tracing::warn!(error = %err, "accept failed");
                continue;
            }
        };
        // the interrupt poke arrives as a normal connection
        if acceptor.is_stopping() {
            return;
        }

        // every read off this socket is now bounded; a stalled client
        // costs one deadline, not a parked thread or tick loop
        if let Err(err) = stream.set_read_timeout(Some(limits.read_timeout)) {
            tracing::warn!(error = %err, "failed to arm the read deadline");
            continue;
        }

        let head = match RequestHead::read(&mut stream, limits.head_size) {
            Ok(head) => head,
            Err(err) => {
                // protocol faults are answered here; the simulation
                // thread only ever sees well-formed heads
                tracing::debug!(error = %err, "rejected request head");
                transport::reject(stream, &err.to_response());
                continue;
            }
        };

        let exchange: Box<dyn Exchange> = Box::new(HttpExchange::new(stream, head));
        // blocks until the simulation thread finishes with the request;
        // the returned exchange is dropped here, closing the connection
        if publisher.publish(exchange).is_err() {
            return;
        }
    }
}
