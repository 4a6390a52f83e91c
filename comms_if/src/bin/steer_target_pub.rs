//! Steering target publisher
//!
//! Publishes a fixed desired heading, and optionally a fixed pose, so that `steer_exec` can be
//! exercised without the rest of the vehicle software.

use comms_if::{
    eqpt::{loc::PoseMsg, steer::SteerTarget},
    net::{encode_topic_msg, zmq, MonitoredSocket, SocketOptions}
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "steer_target_pub")]
struct Opt {
    /// Desired heading to publish, in radians.
    #[structopt(allow_hyphen_values = true)]
    target_rad: f64,

    /// Also publish a pose with this heading, in radians.
    #[structopt(long, allow_hyphen_values = true)]
    pose_yaw_rad: Option<f64>,

    /// Endpoint to bind the target publisher to.
    #[structopt(long, default_value = "tcp://*:5011")]
    target_endpoint: String,

    /// Endpoint to bind the pose publisher to.
    #[structopt(long, default_value = "tcp://*:5010")]
    pose_endpoint: String,

    /// Topic of target messages.
    #[structopt(long, default_value = "target")]
    target_topic: String,

    /// Topic of pose messages.
    #[structopt(long, default_value = "car_pos")]
    pose_topic: String,

    /// Publishing period in milliseconds.
    #[structopt(long, default_value = "100")]
    period_ms: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Opt::from_args();

    let ctx = zmq::Context::new();

    let pub_options = || SocketOptions {
        bind: true,
        block_on_first_connect: false,
        ..Default::default()
    };

    let target_socket = MonitoredSocket::new(
        &ctx,
        zmq::PUB,
        pub_options(),
        &opt.target_endpoint
    )?;

    let pose_socket = match opt.pose_yaw_rad {
        Some(_) => Some(MonitoredSocket::new(&ctx, zmq::PUB, pub_options(), &opt.pose_endpoint)?),
        None => None
    };

    println!("Publishing target {} rad on {}", opt.target_rad, opt.target_endpoint);

    loop {
        let target = encode_topic_msg(&opt.target_topic, &SteerTarget { value: opt.target_rad })?;
        if let Err(e) = target_socket.send(&target, 0) {
            println!("Failed to send target: {}", e)
        }

        if let (Some(socket), Some(yaw)) = (&pose_socket, opt.pose_yaw_rad) {
            let pose = encode_topic_msg(&opt.pose_topic, &PoseMsg::from_yaw(yaw))?;
            if let Err(e) = socket.send(&pose, 0) {
                println!("Failed to send pose: {}", e)
            }
        }

        std::thread::sleep(std::time::Duration::from_millis(opt.period_ms));
    }
}
