//! Virtual CPU behaviour, observed through full simulation runs: cycle
//! charging, quantum timeouts, the store/load guard and I/O issue.

use contigsim::{Job, MachineConfig, Opcode, Simulator, Workload};

fn workload(quantum: i64, jobs: Vec<Job>) -> Workload {
    Workload {
        machine: MachineConfig {
            max_memory: 40,
            cpu_allocated: quantum,
            switch_time: 1,
        },
        jobs,
    }
}

fn run(workload: Workload) -> (String, i64, i64) {
    let mut simulator = Simulator::new(workload, Vec::new());
    simulator.run().unwrap();
    let clock = simulator.global_clock();
    let cpu_time = simulator.total_cpu_time();
    let trace = String::from_utf8(simulator.into_writer()).unwrap();
    (trace, clock, cpu_time)
}

#[test]
fn compute_charges_its_cycles_operand() {
    let (trace, clock, cpu_time) = run(workload(
        100,
        vec![Job {
            process_id: 1,
            max_memory_needed: 10,
            program: vec![Opcode::Compute {
                iterations: 5,
                cycles: 7,
            }],
        }],
    ));

    assert!(trace.contains("compute\n"));
    assert!(trace.contains("CPU Cycles Used: 7\n"));
    assert_eq!(cpu_time, 7);
    // 7 compute cycles plus one dispatch charge and the final charge.
    assert_eq!(clock, 9);
}

#[test]
fn quantum_expiry_requeues_with_saved_state() {
    // Quantum of 3: the first Compute overruns it and times out with one
    // instruction left; the second dispatch finishes the program.
    let (trace, clock, cpu_time) = run(workload(
        3,
        vec![Job {
            process_id: 1,
            max_memory_needed: 10,
            program: vec![
                Opcode::Compute {
                    iterations: 1,
                    cycles: 5,
                },
                Opcode::Compute {
                    iterations: 1,
                    cycles: 4,
                },
            ],
        }],
    ));

    assert_eq!(
        trace
            .matches("Process 1 has a TimeOUT interrupt and is moved to the ReadyQueue.\n")
            .count(),
        1
    );
    assert_eq!(trace.matches("Process 1 has moved to Running.\n").count(), 2);
    assert!(trace.contains("CPU Cycles Used: 9\n"));
    assert_eq!(cpu_time, 9);
    // 9 compute cycles, two dispatch charges, one final charge.
    assert_eq!(clock, 12);
}

#[test]
fn io_issue_suspends_without_charging_cpu_time() {
    let (trace, clock, cpu_time) = run(workload(
        10,
        vec![Job {
            process_id: 1,
            max_memory_needed: 10,
            program: vec![
                Opcode::Print { io_cycles: 3 },
                Opcode::Compute {
                    iterations: 1,
                    cycles: 2,
                },
            ],
        }],
    ));

    let print_at = trace.find("print\n").unwrap();
    let issued_at = trace
        .find("Process 1 issued an IOInterrupt and moved to the IOWaitingQueue.\n")
        .unwrap();
    let completed_at = trace
        .find("Process 1 completed I/O and is moved to the ReadyQueue.\n")
        .unwrap();
    assert!(print_at < issued_at);
    assert!(issued_at < completed_at);

    // The 3 I/O cycles are absorbed by the clock through the wait queue,
    // never by the process's CPU accounting.
    assert!(trace.contains("CPU Cycles Used: 2\n"));
    assert_eq!(cpu_time, 2);
    assert_eq!(clock, 8);
}

#[test]
fn store_then_load_round_trips_through_the_register() {
    // Store writes 42 at offset 0 of the process's region; the Load reads
    // it back. Both addresses pass the limit check.
    let (trace, _, _) = run(workload(
        100,
        vec![Job {
            process_id: 1,
            max_memory_needed: 10,
            program: vec![
                Opcode::Store {
                    value: 42,
                    address_offset: 0,
                },
                Opcode::Load { address_offset: 0 },
            ],
        }],
    ));

    assert!(trace.contains("stored\n"));
    assert!(trace.contains("loaded\n"));
    assert!(trace.contains("Register Value: 42\n"));
    assert!(trace.contains("CPU Cycles Used: 2\n"));
}

#[test]
fn out_of_range_store_and_load_report_and_continue() {
    // Offset 50 lands past the process's region, offset -1 lands before
    // it. Neither touches memory, both still cost their cycle, and the
    // register keeps the Store's operand value.
    let (trace, _, cpu_time) = run(workload(
        100,
        vec![Job {
            process_id: 1,
            max_memory_needed: 10,
            program: vec![
                Opcode::Store {
                    value: 42,
                    address_offset: 50,
                },
                Opcode::Load { address_offset: -1 },
            ],
        }],
    ));

    assert!(trace.contains("store error!\n"));
    assert!(trace.contains("load error!\n"));
    assert!(!trace.contains("stored\n"));
    assert!(!trace.contains("loaded\n"));
    assert!(trace.contains("Register Value: 42\n"));
    assert!(trace.contains("CPU Cycles Used: 2\n"));
    assert_eq!(cpu_time, 2);
}

#[test]
fn termination_report_carries_the_sentinel_program_counter() {
    let (trace, _, _) = run(workload(
        100,
        vec![Job {
            process_id: 1,
            max_memory_needed: 10,
            program: vec![Opcode::Compute {
                iterations: 1,
                cycles: 1,
            }],
        }],
    ));

    // The instruction region starts at 10, so the terminal PC is 9.
    assert!(trace.contains("Program Counter: 9\n"));
    assert!(trace.contains("Instruction Base: 10\n"));
    assert!(trace.contains("Data Base: 11\n"));
    assert!(trace.contains("Main Memory Base: 0\n"));
}
