// Random agent against the in-process loopback robot server.
//
// Run with: cargo run --example random_agent -- [env-id]

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;
use ur5_avoidance_gym::{Env, KwArgs, LoopbackServer, Space, make};

fn main() -> ur5_avoidance_gym::Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    let id = std::env::args().nth(1).unwrap_or_else(|| "MovingBoxTargetUR5DoF3Sim-v0".to_string());
    let mut env = make(&id, &KwArgs::new(), LoopbackServer::new(0))?;
    if let Some(cmd) = env.config().deployment.launch_command() {
        info!(%cmd, "a real simulation would be launched with");
    }

    let mut rng = StdRng::seed_from_u64(0);
    for episode in 0..3 {
        env.reset(Some(episode))?;
        let mut ret = 0.0;
        loop {
            let action = env.action_space().sample(&mut rng);
            let step = env.step(action)?;
            ret += step.reward;
            if step.done() {
                info!(
                    episode,
                    steps = env.elapsed_steps(),
                    episode_return = ret,
                    status = ?step.info.get_str("final_status"),
                    "episode finished"
                );
                for (key, value) in step.info.iter() {
                    info!(key, ?value, "final info");
                }
                break;
            }
        }
    }
    if let Some(frame) = env.render() {
        println!("{frame:?}");
    }
    Ok(())
}
