//! Several threads passing work around, each traced in its own lane.
//!
//! Try running with `LANETRACE_DEBUG_STATEMENTS=false` or
//! `LANETRACE_LANE_MARKING=false`, and `RUST_LOG=trace` to see lane
//! allocation.

use std::sync::mpsc;
use std::time::Duration;

use lanetrace::{debug_block, msg};

fn main() -> Result<(), lanetrace::ConfigError> {
    env_logger::builder().init();
    lanetrace::init_from_env()?;

    let (tx, rx) = mpsc::channel::<u32>();

    msg!("spawning workers");

    std::thread::scope(|s| {
        for worker in 0..3 {
            let tx = tx.clone();
            s.spawn(move || {
                msg!("worker ", worker, " started");
                for job in 0..2 {
                    let value = worker * 10 + job;
                    debug_block!(format!("computed {value}"), "sending to collector");
                    if tx.send(value).is_err() {
                        msg!("collector hung up");
                        return;
                    }
                    std::thread::sleep(Duration::from_millis(5));
                }
                msg!("worker ", worker, " done");
            });
        }
        drop(tx);

        s.spawn(move || {
            let total: u32 = rx.iter().sum();
            msg!("collector total = ", total);
        });
    });

    msg!("all threads finished");
    Ok(())
}
