use revpref::obs::Observations;
use revpref::{data_rationalizable, money_pump_index, rationality_measures};

fn main() {
    // Read the dataset, report the index battery.
    let (obs, alphas) =
        Observations::new_from_stdin().expect("c Failed to read the observations!");
    let values = rationality_measures(&obs, &alphas).expect("c Solve failed!");
    let rational = data_rationalizable(&obs).expect("c GARP check failed!");
    let pump = money_pump_index(&obs).expect("c Money-pump enumeration failed!");

    println!("c rationalizable {}", rational);
    for v in &values {
        println!("{}", v);
    }
    println!(
        "c mpi {} {} {}",
        pump.avg_mpi, pump.normalized_mpi, pump.cycles
    );
}
