//! Listener socket setup (spec.md §4.8 "Listener").
//!
//! Grounded on `mynet/make_srvsock.cpp`: enumerate address candidates for
//! the configured port, and bind+listen on the first one that succeeds.
//! The original walks a `getaddrinfo` linked list one node at a time; we
//! walk `ToSocketAddrs`' candidate iterator the same way, using `socket2`
//! for the `bind`/`listen` calls the teacher already depends on.

use socket2::{Domain, Socket, Type};
use std::{
    io,
    net::{TcpListener, ToSocketAddrs},
};

/// Resolves `0.0.0.0:<port>`, tries each returned IPv4 candidate in turn,
/// and returns the listener bound on the first one that binds and listens
/// successfully. Returns `None` if every candidate is exhausted.
pub fn bind(port: u16, backlog: i32) -> Option<TcpListener> {
    let candidates = ("0.0.0.0", port).to_socket_addrs().ok()?;

    for addr in candidates.filter(|a| a.is_ipv4()) {
        match try_bind(addr, backlog) {
            Ok(listener) => return Some(listener),
            Err(_) => continue,
        }
    }

    None
}

fn try_bind(addr: std::net::SocketAddr, backlog: i32) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, None)?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;
    socket.set_nonblocking(false)?;
    Ok(socket.into())
}
