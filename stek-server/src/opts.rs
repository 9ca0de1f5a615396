/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint, value_parser};

use stek_types::net::{RustlsCertificatePair, load_ticket_keys};

use crate::{DEFAULT_RESPONSE_BODY, StekServerConfig, TicketKeyConfig};

const ARGS_VERBOSE: &str = "verbose";
const ARGS_LISTEN: &str = "listen";
const ARGS_CERT: &str = "cert";
const ARGS_KEY: &str = "key";
const ARGS_TICKET_KEY_FILE: &str = "ticket-key-file";
const ARGS_TICKET_KEY_COUNT: &str = "ticket-key-count";
const ARGS_TICKET_LIFETIME: &str = "ticket-lifetime";
const ARGS_ROTATE_INTERVAL: &str = "rotate-interval";
const ARGS_MAX_TICKET_KEYS: &str = "max-ticket-keys";
const ARGS_TICKETS: &str = "tickets";
const ARGS_SESSION_CACHE: &str = "session-cache";
const ARGS_NO_TICKET: &str = "no-ticket";
const ARGS_RESPONSE: &str = "response";
const ARGS_REQUEST_TIMEOUT: &str = "request-timeout";

pub struct ProcArgs {
    pub verbose_level: u8,
    pub server: StekServerConfig,
}

pub fn command() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::new(ARGS_VERBOSE)
                .help("Show verbose output")
                .num_args(0)
                .action(ArgAction::Count)
                .short('v')
                .long(ARGS_VERBOSE),
        )
        .arg(
            Arg::new(ARGS_LISTEN)
                .help("Listen address")
                .value_name("ADDR")
                .long(ARGS_LISTEN)
                .num_args(1)
                .value_parser(value_parser!(SocketAddr))
                .default_value("[::]:8443"),
        )
        .arg(
            Arg::new(ARGS_CERT)
                .help("Certificate chain file in PEM format")
                .value_name("CERT FILE")
                .long(ARGS_CERT)
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath)
                .default_value("certs/server.crt"),
        )
        .arg(
            Arg::new(ARGS_KEY)
                .help("Private key file in PEM format")
                .value_name("KEY FILE")
                .long(ARGS_KEY)
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath)
                .default_value("certs/server.key"),
        )
        .arg(
            Arg::new(ARGS_TICKET_KEY_FILE)
                .help("Load session ticket keys from file, one hex encoded 32 bytes key per line")
                .value_name("KEY FILE")
                .long(ARGS_TICKET_KEY_FILE)
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath)
                .conflicts_with(ARGS_TICKET_KEY_COUNT),
        )
        .arg(
            Arg::new(ARGS_TICKET_KEY_COUNT)
                .help("Number of random session ticket keys to generate")
                .value_name("COUNT")
                .long(ARGS_TICKET_KEY_COUNT)
                .num_args(1)
                .value_parser(value_parser!(usize))
                .default_value("2"),
        )
        .arg(
            Arg::new(ARGS_TICKET_LIFETIME)
                .help("Session ticket lifetime in seconds")
                .value_name("SECONDS")
                .long(ARGS_TICKET_LIFETIME)
                .num_args(1)
                .value_parser(value_parser!(u32))
                .default_value("7200"),
        )
        .arg(
            Arg::new(ARGS_ROTATE_INTERVAL)
                .help("Rotate the session ticket encrypt key at this interval in seconds")
                .value_name("SECONDS")
                .long(ARGS_ROTATE_INTERVAL)
                .num_args(1)
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new(ARGS_MAX_TICKET_KEYS)
                .help("Max number of session ticket keys kept after rotation")
                .value_name("COUNT")
                .long(ARGS_MAX_TICKET_KEYS)
                .num_args(1)
                .value_parser(value_parser!(usize))
                .default_value("3"),
        )
        .arg(
            Arg::new(ARGS_TICKETS)
                .help("Number of TLS 1.3 session tickets sent after each handshake")
                .value_name("COUNT")
                .long(ARGS_TICKETS)
                .num_args(1)
                .value_parser(value_parser!(usize))
                .default_value("2"),
        )
        .arg(
            Arg::new(ARGS_SESSION_CACHE)
                .help("Size of the stateful server session cache, 0 to disable")
                .value_name("SIZE")
                .long(ARGS_SESSION_CACHE)
                .num_args(1)
                .value_parser(value_parser!(usize))
                .default_value("0"),
        )
        .arg(
            Arg::new(ARGS_NO_TICKET)
                .help("Disable stateless session tickets")
                .action(ArgAction::SetTrue)
                .long(ARGS_NO_TICKET)
                .conflicts_with_all([ARGS_TICKET_KEY_FILE, ARGS_ROTATE_INTERVAL]),
        )
        .arg(
            Arg::new(ARGS_RESPONSE)
                .help("Response body")
                .value_name("BODY")
                .long(ARGS_RESPONSE)
                .num_args(1)
                .default_value(DEFAULT_RESPONSE_BODY),
        )
        .arg(
            Arg::new(ARGS_REQUEST_TIMEOUT)
                .help("Close the connection if no request is received in this many seconds")
                .value_name("SECONDS")
                .long(ARGS_REQUEST_TIMEOUT)
                .num_args(1)
                .value_parser(value_parser!(u64))
                .default_value("30"),
        )
}

fn parse_ticket_config(args: &ArgMatches) -> anyhow::Result<TicketKeyConfig> {
    let mut config = TicketKeyConfig::default();

    if let Some(file) = args.get_one::<PathBuf>(ARGS_TICKET_KEY_FILE) {
        let keys = load_ticket_keys(file)?;
        config.set_keys(keys);
    } else if let Some(count) = args.get_one::<usize>(ARGS_TICKET_KEY_COUNT) {
        config.set_random_keys(*count)?;
    }
    if let Some(lifetime) = args.get_one::<u32>(ARGS_TICKET_LIFETIME) {
        config.set_lifetime(*lifetime);
    }
    if let Some(secs) = args.get_one::<u64>(ARGS_ROTATE_INTERVAL) {
        config.set_rotate_interval(Duration::from_secs(*secs));
    }
    if let Some(max) = args.get_one::<usize>(ARGS_MAX_TICKET_KEYS) {
        config.set_max_keys(*max);
    }

    config.check()?;
    Ok(config)
}

pub fn parse_clap(args: &ArgMatches) -> anyhow::Result<ProcArgs> {
    let verbose_level = args.get_one::<u8>(ARGS_VERBOSE).copied().unwrap_or(0);

    let listen = args
        .get_one::<SocketAddr>(ARGS_LISTEN)
        .copied()
        .context("no listen address set")?;
    let cert_file = args
        .get_one::<PathBuf>(ARGS_CERT)
        .context("no certificate file set")?;
    let key_file = args
        .get_one::<PathBuf>(ARGS_KEY)
        .context("no private key file set")?;
    let cert_pair = RustlsCertificatePair::load_pem_files(cert_file, key_file)?;

    let mut server = StekServerConfig::new(listen, cert_pair);
    if args.get_flag(ARGS_NO_TICKET) {
        server.set_no_ticket();
    } else {
        let ticket = parse_ticket_config(args).context("invalid session ticket config")?;
        server.set_ticket(ticket);
    }
    if let Some(count) = args.get_one::<usize>(ARGS_TICKETS) {
        server.tls_mut().set_send_tls13_tickets(*count);
    }
    if let Some(size) = args.get_one::<usize>(ARGS_SESSION_CACHE) {
        server.tls_mut().set_session_cache_size(*size);
    }
    if let Some(body) = args.get_one::<String>(ARGS_RESPONSE) {
        server.set_response_body(body.to_string());
    }
    if let Some(secs) = args.get_one::<u64>(ARGS_REQUEST_TIMEOUT) {
        server.set_request_timeout(Duration::from_secs(*secs));
    }

    Ok(ProcArgs {
        verbose_level,
        server,
    })
}
