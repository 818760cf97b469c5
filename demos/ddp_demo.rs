//! Demonstration of disturbance-decoupling analysis
//!
//! Computes the maximal controlled-invariant subspace V* for a two-state
//! system, tests whether the disturbance can be decoupled from the output,
//! and synthesizes the decoupling feedback.

use geoctrl_rs::geometric::check_disturbance_decoupling;
use ndarray::arr2;

fn main() {
    println!("=== Disturbance Decoupling Demonstration ===\n");

    // ẋ = A·x + B·u + E·w, y = C·x
    let a = arr2(&[[0.0, 1.0], [2.0, 0.0]]);
    let b = arr2(&[[0.0], [1.0]]);
    let c = arr2(&[[1.0, -1.0]]);

    println!("A = \n{:?}", a);
    println!("B = \n{:?}", b);
    println!("C = \n{:?}", c);

    for e in [arr2(&[[1.0], [1.0]]), arr2(&[[1.0], [0.0]])] {
        println!("\nDisturbance matrix E = \n{:?}", e);
        match check_disturbance_decoupling(&a, &b, &e, &c, None) {
            Ok(result) => {
                println!("dim V* = {}", result.v_star.ncols());
                println!("V* basis = \n{:?}", result.v_star);
                if result.solvable {
                    println!("DDP is solvable.");
                    if let Some(f) = result.feedback {
                        println!("Decoupling feedback F = \n{:?}", f);
                        let a_cl = &a + &b.dot(&f);
                        println!("Closed loop A + B*F = \n{:?}", a_cl);
                    }
                } else {
                    println!("DDP is NOT solvable: Im(E) is not contained in V*.");
                }
            }
            Err(err) => println!("Analysis failed: {}", err),
        }
    }
}
