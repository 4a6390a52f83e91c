//! Steering command subscriber
//!
//! Prints the normalised steering commands published by `steer_exec`.

use comms_if::{
    eqpt::steer::NormalisedSteerCmd,
    net::{decode_topic_msg, zmq, MonitoredSocket, SocketOptions}
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "steer_cmd_sub")]
struct Opt {
    /// Endpoint of the steering command publisher.
    #[structopt(long, default_value = "tcp://localhost:5012")]
    endpoint: String,

    /// Topic of steering commands.
    #[structopt(long, default_value = "steering_normalized")]
    topic: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Opt::from_args();

    let ctx = zmq::Context::new();

    let socket = MonitoredSocket::new(
        &ctx,
        zmq::SUB,
        SocketOptions::default(),
        &opt.endpoint
    )?;

    socket.set_subscribe(opt.topic.as_bytes())?;

    loop {
        let msg = match socket.recv_string(0)? {
            Ok(s) => s,
            Err(_) => {
                println!("Got a non UTF-8 message");
                continue
            }
        };

        match decode_topic_msg::<NormalisedSteerCmd>(&opt.topic, &msg) {
            Ok(cmd) => println!(
                "[{}] {}: {:+.4}",
                cmd.timestamp.format("%H:%M:%S%.3f"),
                cmd.frame_id,
                cmd.value
            ),
            Err(e) => println!("Could not decode message: {}", e)
        }
    }
}
