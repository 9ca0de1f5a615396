/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint, value_parser};
use url::Url;

use stek_types::net::load_ca_certs;

use crate::StekClientConfig;

const ARGS_VERBOSE: &str = "verbose";
const ARGS_URL: &str = "url";
const ARGS_CA_CERT: &str = "ca-cert";
const ARGS_REQUESTS: &str = "requests";
const ARGS_INTERVAL: &str = "interval";
const ARGS_NO_SESSION_CACHE: &str = "no-session-cache";
const ARGS_TLS_NAME: &str = "tls-name";
const ARGS_TIMEOUT: &str = "timeout";
const ARGS_RESOLVE: &str = "resolve";

pub struct ProcArgs {
    pub verbose_level: u8,
    pub requests: usize,
    pub interval: Duration,
    pub client: StekClientConfig,
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
            Arg::new(ARGS_URL)
                .help("Target url")
                .value_name("URL")
                .long(ARGS_URL)
                .num_args(1)
                .value_parser(value_parser!(Url))
                .value_hint(ValueHint::Url)
                .default_value("https://localhost:8443"),
        )
        .arg(
            Arg::new(ARGS_CA_CERT)
                .help("CA certificate file in PEM format to verify the server")
                .value_name("CA CERT FILE")
                .long(ARGS_CA_CERT)
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath)
                .default_value("certs/server.crt"),
        )
        .arg(
            Arg::new(ARGS_REQUESTS)
                .help("Number of requests, each over a new connection")
                .value_name("COUNT")
                .short('n')
                .long(ARGS_REQUESTS)
                .num_args(1)
                .value_parser(value_parser!(usize))
                .default_value("3"),
        )
        .arg(
            Arg::new(ARGS_INTERVAL)
                .help("Sleep between requests in milliseconds")
                .value_name("MILLISECONDS")
                .long(ARGS_INTERVAL)
                .num_args(1)
                .value_parser(value_parser!(u64))
                .default_value("0"),
        )
        .arg(
            Arg::new(ARGS_NO_SESSION_CACHE)
                .help("Disable client side session cache, so no session will be resumed")
                .action(ArgAction::SetTrue)
                .long(ARGS_NO_SESSION_CACHE),
        )
        .arg(
            Arg::new(ARGS_TLS_NAME)
                .help("TLS verify name for the server certificate, default to the url host")
                .value_name("SERVER NAME")
                .long(ARGS_TLS_NAME)
                .num_args(1),
        )
        .arg(
            Arg::new(ARGS_TIMEOUT)
                .help("Timeout for each request in seconds")
                .value_name("SECONDS")
                .long(ARGS_TIMEOUT)
                .num_args(1)
                .value_parser(value_parser!(u64))
                .default_value("10"),
        )
        .arg(
            Arg::new(ARGS_RESOLVE)
                .help("Provide a custom address for the url host, like curl")
                .value_name("HOST:PORT:ADDRESS")
                .long(ARGS_RESOLVE)
                .num_args(1),
        )
}

fn parse_resolve_value(v: &str) -> anyhow::Result<(&str, u16, IpAddr)> {
    let mut parts = v.splitn(3, ':');

    let host = parts.next().ok_or_else(|| anyhow!("no host field found"))?;
    let port = parts.next().ok_or_else(|| anyhow!("no port field found"))?;
    let ip = parts.next().ok_or_else(|| anyhow!("no ip field found"))?;

    let port = u16::from_str(port).map_err(|e| anyhow!("invalid port: {e}"))?;
    let ip = ip.trim_start_matches('[').trim_end_matches(']');
    let ip = IpAddr::from_str(ip).map_err(|e| anyhow!("invalid ip address: {e}"))?;
    Ok((host, port, ip))
}

pub fn parse_clap(args: &ArgMatches) -> anyhow::Result<ProcArgs> {
    let verbose_level = args.get_one::<u8>(ARGS_VERBOSE).copied().unwrap_or(0);

    let url = args.get_one::<Url>(ARGS_URL).context("no url set")?;
    let mut client = StekClientConfig::new(url)?;

    if let Some(file) = args.get_one::<PathBuf>(ARGS_CA_CERT) {
        let ca_certs = load_ca_certs(file).context(format!(
            "failed to load ca certs from file {}",
            file.display()
        ))?;
        client.tls_mut().set_ca_certificates(ca_certs);
    }
    if args.get_flag(ARGS_NO_SESSION_CACHE) {
        client.tls_mut().set_no_session_cache();
    }
    if let Some(name) = args.get_one::<String>(ARGS_TLS_NAME) {
        client.set_tls_name(name.to_string());
    }
    if let Some(secs) = args.get_one::<u64>(ARGS_TIMEOUT) {
        client.set_timeout(Duration::from_secs(*secs));
    }
    if let Some(v) = args.get_one::<String>(ARGS_RESOLVE) {
        let (host, port, ip) =
            parse_resolve_value(v).context(format!("invalid resolve value {v}"))?;
        if host != client.host() || port != client.port() {
            return Err(anyhow!(
                "resolve value {v} does not match {}:{}",
                client.host(),
                client.port()
            ));
        }
        client.set_resolve(ip);
    }

    let requests = args.get_one::<usize>(ARGS_REQUESTS).copied().unwrap_or(3);
    let interval = args
        .get_one::<u64>(ARGS_INTERVAL)
        .map(|v| Duration::from_millis(*v))
        .unwrap_or_default();

    Ok(ProcArgs {
        verbose_level,
        requests,
        interval,
        client,
    })
}
