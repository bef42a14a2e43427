use std::env;

// Reduction kernels the crate can be built to use by default
#[derive(PartialEq, Eq, Debug)]
struct KernelChoice {
    name: &'static str,
    cfg_value: &'static str,
}

impl KernelChoice {
    fn choices() -> Vec<KernelChoice> {
        vec![
            KernelChoice {
                name: "unrolled",
                cfg_value: "unrolled",
            },
            KernelChoice {
                name: "basic",
                cfg_value: "basic",
            },
        ]
    }

    // First entry is the fallback when nothing (or something unknown) is requested
    fn select(requested: Option<&str>) -> KernelChoice {
        let mut choices = Self::choices();
        let position = requested
            .map(|r| r.trim().to_lowercase())
            .and_then(|r| choices.iter().position(|c| c.name == r))
            .unwrap_or(0);
        choices.swap_remove(position)
    }
}

fn main() {
    println!("cargo:rerun-if-env-changed=TRANSMUL_KERNEL");
    println!("cargo::rustc-check-cfg=cfg(transmul_kernel, values(\"basic\", \"unrolled\"))");

    let requested = env::var("TRANSMUL_KERNEL").ok();
    let choice = KernelChoice::select(requested.as_deref());

    if let Some(r) = requested.as_deref() {
        if !r.trim().eq_ignore_ascii_case(choice.name) {
            println!("cargo:warning=unknown TRANSMUL_KERNEL `{r}`, using `{}`", choice.name);
        }
    }

    println!("cargo:rustc-cfg=transmul_kernel=\"{}\"", choice.cfg_value);
}
