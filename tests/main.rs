use clprobe::{prelude::*, cli::found_line, inventory::Inventory, vecadd::{self, run, verify, VecAddConfig}};

/// Returns `false`, after saying so, when no OpenCL runtime is installed.
fn runtime_present () -> bool {
    let _ = env_logger::builder().is_test(true).try_init();

    match Platform::count() {
        Ok(0) => {
            eprintln!("skipped: no OpenCL platform installed");
            false
        },
        Ok(_) => Device::first().map(|x| x.is_some()).unwrap_or(false),
        Err(e) => {
            eprintln!("skipped: platform query failed: {e:?}");
            false
        }
    }
}

const TEST_KERNEL : &'static str = "__kernel void add (const int n, __global const int* rhs, __global const int* in, __global int* out) {
    for (int id = get_global_id(0); id<n; id += get_global_size(0)) {
        out[id] = in[id] + rhs[id];
    }
}";

#[test]
fn count_matches_list () {
    if !runtime_present() { return }
    assert_eq!(Platform::count().unwrap() as usize, Platform::all().unwrap().len());
}

#[test]
fn inventory_lists_devices () {
    if !runtime_present() { return }

    let inventory = Inventory::discover(DeviceType::ALL).unwrap();
    assert_eq!(inventory.platform_count, Platform::all().unwrap().len());
    assert!(inventory.device_count() > 0);
    for platform in &inventory.platforms {
        assert!(!platform.name.is_empty());
    }
}

#[test]
fn device_count_agrees_with_inventory () {
    if !runtime_present() { return }

    let inventory = Inventory::discover(DeviceType::ALL).unwrap();
    assert_eq!(vecadd::device_count(&VecAddConfig::default()).unwrap(), inventory.device_count());

    let first = VecAddConfig::new().platform(0);
    assert_eq!(vecadd::device_count(&first).unwrap(), inventory.platforms[0].devices.len());
}

#[test]
fn counts_known_before_selection_fails () {
    if !runtime_present() { return }

    let config = VecAddConfig::new().platform(Platform::all().unwrap().len());
    let devices = vecadd::device_count(&config).unwrap();
    assert_eq!(found_line(devices, "device"), "Found 0 device(s)");
    assert!(run::<i32>(&config).is_err());
}

#[test]
fn sum () {
    if !runtime_present() { return }

    let device = Device::first().unwrap().unwrap();
    let ctx = Context::new(None, core::slice::from_ref(&device)).unwrap();
    let queue = CommandQueue::new(&ctx, &device, None).unwrap();

    let left = MemBuffer::new(&ctx, MemFlags::READ_ONLY, &[1, 2, 3, 4, 5]).unwrap();
    let right = MemBuffer::new(&ctx, MemFlags::READ_ONLY, &[6, 7, 8, 9, 10]).unwrap();
    let result = unsafe { MemBuffer::<i32>::uninit(&ctx, 5, MemFlags::WRITE_ONLY).unwrap() };

    let program = Program::from_source(&ctx, TEST_KERNEL).unwrap();
    let mut kernel = Kernel::new(&program, "add").unwrap();
    assert_eq!(kernel.name().unwrap(), "add");
    assert_eq!(kernel.num_args().unwrap(), 4);

    kernel.set_arg(0, 5i32).unwrap();
    kernel.set_mem_arg(1, &right).unwrap();
    kernel.set_mem_arg(2, &left).unwrap();
    kernel.set_mem_arg(3, &result).unwrap();

    let event = kernel.enqueue(&queue, &[5], None).unwrap();
    event.wait().unwrap();
    assert_eq!(event.status().unwrap(), EventStatus::Complete);

    assert_eq!(result.to_vec(&queue).unwrap(), [7, 9, 11, 13, 15]);
}

#[test]
fn partial_write_and_read () {
    if !runtime_present() { return }

    let device = Device::first().unwrap().unwrap();
    let ctx = Context::new(None, core::slice::from_ref(&device)).unwrap();
    let queue = CommandQueue::new(&ctx, &device, None).unwrap();

    let mut buffer = MemBuffer::new(&ctx, None, &[0u32; 8]).unwrap();
    buffer.write(&queue, 2, &[5, 6, 7]).unwrap();

    let mut tail = [0u32; 4];
    buffer.read(&queue, 4, &mut tail).unwrap();
    assert_eq!(tail, [7, 0, 0, 0]);
    assert_eq!(buffer.to_vec(&queue).unwrap(), [0, 0, 5, 6, 7, 0, 0, 0]);
    assert!(buffer.write(&queue, 6, &[1, 2, 3]).is_err());
}

#[test]
fn broken_kernel_fails_to_build () {
    if !runtime_present() { return }

    let device = Device::first().unwrap().unwrap();
    let ctx = Context::new(None, core::slice::from_ref(&device)).unwrap();
    let program = Program::from_source(&ctx, "__kernel void broken(__global int* x) { x[0] = ; }");
    assert!(program.is_err());
}

#[test]
fn vecadd_default_passes () {
    if !runtime_present() { return }

    let report = run::<i32>(&VecAddConfig::default()).unwrap();
    assert!(report.passed(), "{:?}", report.verification.mismatches);
    assert_eq!(report.c, [0, 2, 4, 6, 8, 10, 12, 14, 16, 18]);
    assert!(report.platform_count >= 1);
    assert!(report.device_count >= 1);
    assert_eq!(report.kernel_time_ns, None);
}

#[test]
fn vecadd_float_with_profiling () {
    if !runtime_present() { return }

    let report = run::<f32>(&VecAddConfig::new().elements(1000).profile(true)).unwrap();
    assert!(report.passed());
    assert_eq!(report.c.len(), 1000);
    assert!(report.kernel_time_ns.is_some());
    assert!(verify(&report.a, &report.b, &report.c).passed());
}

#[test]
fn vecadd_bad_indices () {
    if !runtime_present() { return }

    let platforms = Platform::all().unwrap().len();
    assert!(run::<i32>(&VecAddConfig::new().platform(platforms)).is_err());
    assert!(vecadd::select_device(&VecAddConfig::new().device(usize::MAX)).is_err());
}

#[cfg(not(feature = "error-stack"))]
#[test]
fn vecadd_bad_platform_code () {
    if !runtime_present() { return }

    let platforms = Platform::all().unwrap().len();
    let err = vecadd::select_device(&VecAddConfig::new().platform(platforms)).unwrap_err();
    assert_eq!(err, ErrorCL::InvalidPlatform);
}
