#[macro_use]
extern crate log;

use std::io::BufRead;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use env_logger::Env;
use pi_flight::config::{self, Config};
use pi_flight::esc::bench::{self, SpinTest};
use pi_flight::esc::ESCs;
use pi_flight::fcs::{FlightController, Runner};
use pi_flight::hal::imu::AccelGyro;
use pi_flight::imu::calibration::{CalibrationData, Calibrator};
use pi_flight::sync::ControlSlot;
use pi_flight::telemetry::{TelemetrySink, TelemetrySlot};
use pi_flight::types::output::Position;
use raspberry_pi::State;

const DEFAULT_CONFIG: &str = "config/drone.yaml";
const CALIBRATION_INTERVAL: Duration = Duration::from_millis(5);
const SLEEP_SLICE: Duration = Duration::from_millis(50);

#[cfg(target_os = "linux")]
fn open_sensor(config: &config::IMU) -> Result<Box<dyn AccelGyro + Send>, String> {
    use drivers::mpu6050::Mpu6050;

    let i2c = drivers::rpi::open_i2c(config.i2c_bus, config.read_timeout())
        .map_err(|e| format!("Unable to open I2C bus {}: {}", config.i2c_bus, e))?;
    let mut mpu = Mpu6050::new(i2c, config.address, config.model);
    mpu.init().map_err(|e| format!("MPU init failed: {}", e))?;
    Ok(Box::new(mpu))
}

#[cfg(not(target_os = "linux"))]
fn open_sensor(_: &config::IMU) -> Result<Box<dyn AccelGyro + Send>, String> {
    Err("IMU access requires Linux".to_owned())
}

#[cfg(target_os = "linux")]
fn open_motors(config: &config::Motors) -> Result<[pi_flight::hal::pwm::PWM; 4], String> {
    drivers::rpi::motor_outputs(config.pins, config.pwm_frequency)
        .map_err(|e| format!("Unable to open motor GPIO: {}", e))
}

#[cfg(not(target_os = "linux"))]
fn open_motors(_: &config::Motors) -> Result<[pi_flight::hal::pwm::PWM; 4], String> {
    Err("GPIO access requires Linux".to_owned())
}

fn init_logger(config: &Config) {
    let level = config.logging.level.to_string().to_lowercase();
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
}

fn fly(config: Config) -> Result<(), String> {
    let calibration = CalibrationData::load(&config.imu.calibration_file)
        .map_err(|e| format!("{}: {}", config.imu.calibration_file.display(), e))?;
    info!("Calibration loaded {:?}", calibration);
    let sensor = open_sensor(&config.imu)?;
    let outputs = open_motors(&config.motors)?;

    let stop = stop_flag()?;

    let control = Arc::new(ControlSlot::default());
    let telemetry = Arc::new(TelemetrySlot::default());
    let state = State {
        control: control.clone(),
        telemetry: telemetry.clone(),
        stale_timeout: config.controller.stale_timeout(),
    };
    let listen = config.controller.listen;
    thread::Builder::new()
        .name("http".to_owned())
        .spawn(move || {
            let result = actix_web::rt::System::new().block_on(raspberry_pi::serve(listen, state));
            if let Err(e) = result {
                error!("HTTP server stopped: {}", e);
            }
        })
        .map_err(|e| format!("Unable to start HTTP server: {}", e))?;

    let mut controller = FlightController::new(&config, calibration, sensor, outputs, control);
    let sink = TelemetrySink::new(&config.logging, telemetry);
    let mut runner = Runner::new(config.control_loop.rate, stop, sink);
    runner.run(&mut controller);
    info!("Stopped after {} overruns", runner.overruns());
    Ok(())
}

fn calibrate(config: Config, samples: usize, output: &Path) -> Result<(), String> {
    let mut sensor = open_sensor(&config.imu)?;
    info!("Keep the drone level and still, taking {} samples", samples);
    let mut calibrator = Calibrator::default();
    for i in 0..samples {
        match sensor.read() {
            Ok(readout) => calibrator.add(&readout),
            Err(e) => warn!("Sample {} dropped: {}", i, e),
        }
        if (i + 1) % 100 == 0 {
            info!("{}/{} samples", i + 1, samples);
        }
        thread::sleep(CALIBRATION_INTERVAL);
    }
    let data = calibrator.finish().ok_or("No valid sample collected")?;
    data.save(output).map_err(|e| e.to_string())?;
    info!("Calibration saved to {}: {:?}", output.display(), data);
    Ok(())
}

fn stop_flag() -> Result<Arc<AtomicBool>, String> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
        .map_err(|e| format!("Unable to install signal handler: {}", e))?;
    Ok(stop)
}

fn prompt(message: &str) {
    println!("{}", message);
    let mut line = String::new();
    if let Err(e) = std::io::stdin().lock().read_line(&mut line) {
        warn!("Unable to read stdin: {}", e);
    }
}

fn motor_test(config: Config, tests: Vec<SpinTest>) -> Result<(), String> {
    let outputs = open_motors(&config.motors)?;
    let stop = stop_flag()?;
    prompt("REMOVE ALL PROPELLERS, press Enter to continue or Ctrl+C to abort");
    if stop.load(Ordering::Relaxed) {
        return Ok(());
    }
    let mut escs = ESCs::new(outputs, &config.motors);
    let sleep = |duration: Duration| {
        let deadline = std::time::Instant::now() + duration;
        while !stop.load(Ordering::Relaxed) {
            let now = std::time::Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
        warn!("Motor test interrupted");
        false
    };
    bench::run(&mut escs, &tests, sleep).map_err(|e| e.to_string())
}

fn calibrate_escs(config: Config) -> Result<(), String> {
    let outputs = open_motors(&config.motors)?;
    prompt("REMOVE ALL PROPELLERS and disconnect the battery, then press Enter");
    let mut escs = ESCs::new(outputs, &config.motors);
    let max = config.motors.max_pulse_width;
    escs.calibrate(|micros| {
        if micros == max {
            prompt("Connect the battery now, wait for the ESCs to beep, then press Enter")
        } else {
            prompt("Wait for the confirmation beeps, then press Enter")
        }
    })
    .map_err(|e| e.to_string())?;
    info!("ESCs calibrated");
    Ok(())
}

fn spin_tests(matches: &clap::ArgMatches) -> Result<Vec<SpinTest>, String> {
    let throttle = matches.value_of("throttle").unwrap_or("15");
    let throttle = throttle.parse::<f32>().map_err(|_| "Throttle not a number")?;
    let duration = matches.value_of("duration").unwrap_or("2");
    let duration = duration.parse::<f32>().map_err(|_| "Duration not a number")?;
    let duration = Duration::try_from_secs_f32(duration).map_err(|e| e.to_string())?;
    if matches.is_present("all") {
        return Ok(vec![SpinTest::new(None, throttle, duration)]);
    }
    match matches.value_of("motor") {
        Some(motor) => {
            let index = motor.parse::<usize>().map_err(|_| "Motor not a number")?;
            let position = match index {
                1..=4 => Position::ALL[index - 1],
                _ => return Err(format!("No such motor {}, expect 1 to 4", index)),
            };
            Ok(vec![SpinTest::new(Some(position), throttle, duration)])
        }
        None => Ok(bench::each_motor(throttle, duration)),
    }
}

fn run<'a>(matches: &clap::ArgMatches<'a>) -> Result<(), String> {
    let config_path = matches.value_of("config").unwrap_or(DEFAULT_CONFIG);
    let config = config::load(config_path).map_err(|e| e.to_string())?;
    init_logger(&config);
    match matches.subcommand() {
        ("calibrate", Some(sub)) => {
            let samples = sub.value_of("samples").unwrap_or("1000");
            let samples = samples.parse::<usize>().map_err(|_| "Samples not a number")?;
            let output = match sub.value_of("output") {
                Some(path) => Path::new(path).to_path_buf(),
                None => config.imu.calibration_file.clone(),
            };
            calibrate(config, samples, &output)
        }
        ("motor-test", Some(sub)) => {
            let tests = spin_tests(sub)?;
            motor_test(config, tests)
        }
        ("calibrate-escs", _) => calibrate_escs(config),
        _ => fly(config),
    }
}

fn main() {
    let matches = clap::App::new("pi-flight")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Raspberry Pi quadrotor flight controller")
        .arg(
            clap::Arg::with_name("config")
                .short("c")
                .long("config")
                .help("Config file")
                .takes_value(true),
        )
        .subcommand(clap::SubCommand::with_name("fly").about("Run the control loop"))
        .subcommand(
            clap::SubCommand::with_name("calibrate")
                .about("Measure IMU offsets with the drone level and still")
                .arg(
                    clap::Arg::with_name("samples")
                        .long("samples")
                        .help("Number of samples")
                        .takes_value(true),
                )
                .arg(
                    clap::Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .help("Calibration file, defaults to the configured one")
                        .takes_value(true),
                ),
        )
        .subcommand(
            clap::SubCommand::with_name("motor-test")
                .about("Spin motors with the propellers removed")
                .arg(
                    clap::Arg::with_name("motor")
                        .short("m")
                        .long("motor")
                        .help("1 front-left, 2 front-right, 3 rear-left, 4 rear-right, each in turn if omitted")
                        .takes_value(true),
                )
                .arg(
                    clap::Arg::with_name("all")
                        .long("all")
                        .help("All motors together")
                        .conflicts_with("motor"),
                )
                .arg(
                    clap::Arg::with_name("throttle")
                        .long("throttle")
                        .help("Percent, 5 to 30 for one motor, 5 to 20 for all")
                        .takes_value(true),
                )
                .arg(
                    clap::Arg::with_name("duration")
                        .long("duration")
                        .help("Seconds, 1 to 5")
                        .takes_value(true),
                ),
        )
        .subcommand(
            clap::SubCommand::with_name("calibrate-escs")
                .about("Teach the ESCs the configured pulse width range"),
        )
        .get_matches();
    if let Err(error) = run(&matches) {
        eprintln!("{}", error);
        std::process::exit(1);
    }
}
