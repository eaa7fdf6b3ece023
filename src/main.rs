//! Binary entry point: runs the UCI protocol loop on stdin/stdout.

use osprey::uci::UciEngine;

fn main() {
    UciEngine::new().run();
}
