//! Relay messages between two post offices joined by an in-memory exchange.
//!
//! This is a simple example to demonstrate how to use the [`postoffice`] library:
//! mailbox ``test1`` in one office posts to mailbox ``test0`` in the other, which
//! replies; each reply triggers the next round trip.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, OnceLock,
};
use tokio::sync::Notify;

use postoffice::{
    router::{Exchange, LocalRouter},
    Address, CliArgs, Dispatcher, Dropbox, OpenedMessage, PostOffice, PostOfficeError,
};

const PING: u32 = 100;
const PONG: u32 = 101;

#[derive(Serialize, Deserialize, Debug)]
struct Round {
    round: usize,
}

#[tokio::main]
async fn main() -> Result<(), PostOfficeError> {
    let args = CliArgs::parse();
    let config = args.post_office_config()?;

    let exchange = Exchange::new_arc();

    let pid0 = config.process_id();
    let pid1 = pid0.wrapping_add(1);

    let office0 = PostOffice::from_config(&config, LocalRouter::new(exchange.clone()));
    let office1 = PostOffice::with_process_id(pid1, LocalRouter::new(exchange.clone()));
    exchange.attach(&office0);
    exchange.attach(&office1);

    let test0: Arc<OnceLock<Dropbox>> = Arc::new(OnceLock::new());
    let test1: Arc<OnceLock<Dropbox>> = Arc::new(OnceLock::new());
    let done = Arc::new(Notify::new());
    let completed = Arc::new(AtomicUsize::new(0));

    let dropbox0 = office0.register_address("test0", {
        let test0 = test0.clone();
        move |message: OpenedMessage| {
            let Some(dropbox) = test0.get() else {
                return;
            };

            match message.parse::<Round>() {
                Ok(round) if message.kind() == PING => {
                    println!(
                        "test0 got round {} from {:?}, replying.",
                        round.round,
                        message.sender().map(Address::to_string)
                    );
                    if let Err(err) = dropbox.post_reply(message, PONG, &round, 0) {
                        logger::error!("test0 failed to reply: {}", err);
                    }
                }
                _ => logger::warn!("test0 ignored a message of kind {}.", message.kind()),
            }
        }
    });

    let dropbox1 = office1.register_address("test1", {
        let test1 = test1.clone();
        let done = done.clone();
        let completed = completed.clone();
        let round_trips = args.round_trips;
        move |message: OpenedMessage| {
            let Some(dropbox) = test1.get() else {
                return;
            };

            let Ok(round) = message.parse::<Round>() else {
                logger::warn!("test1 ignored a message of kind {}.", message.kind());
                return;
            };

            let count = completed.fetch_add(1, Ordering::SeqCst) + 1;
            println!("test1 got the reply to round {}.", round.round);

            if round_trips.is_some_and(|limit| count >= limit) {
                done.notify_one();
                return;
            }

            let next = Round {
                round: round.round + 1,
            };
            if let Err(err) = dropbox.post(&Address::new(pid0, "test0"), PING, &next) {
                logger::error!("test1 failed to post: {}", err);
            }
        }
    });

    // Nothing is processed before the dispatchers start.
    let _ = test0.set(dropbox0);
    let _ = test1.set(dropbox1);

    let dispatchers = [office0.clone(), office1.clone()].map(|office| {
        let dispatcher = Arc::new(Dispatcher::from_config(office, &config));
        dispatcher.start();
        dispatcher
    });

    if let Some(dropbox) = test1.get() {
        dropbox.post(&Address::new(pid0, "test0"), PING, &Round { round: 1 })?;
    }

    tokio::select! {
        _ = done.notified() => {
            logger::info!("Completed {} round trips.", completed.load(Ordering::SeqCst));
        },
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger::info!("Interrupted.");
        },
    }

    dispatchers.iter().for_each(|dispatcher| dispatcher.stop());

    println!(
        "Relayed {} round trips between process {} and process {}.",
        completed.load(Ordering::SeqCst),
        pid0,
        pid1
    );

    Ok(())
}
