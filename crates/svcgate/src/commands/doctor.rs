use anyhow::Result;
use std::path::Path;
use std::process::Command;
use svcgate_core::config::Config;
use svcgate_core::PresetCatalog;
use svcgate_infer::EngineKind;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;
    let workdir = &config.inference.workdir;

    println!("svcgate dependency check\n");

    let mut all_ok = true;

    // Check Python
    print!("python:          ");
    let python = match config.python_path() {
        Ok(path) => match Command::new(&path).arg("--version").output() {
            Ok(out) => {
                let v = String::from_utf8_lossy(&out.stdout);
                println!("OK ({}, {})", v.trim().replace("Python ", ""), path.display());
                Some(path)
            }
            Err(_) => {
                println!("FOUND but failed to get version ({})", path.display());
                all_ok = false;
                None
            }
        },
        Err(_) => {
            println!("NOT FOUND");
            println!("                 Set inference.python or install python3");
            all_ok = false;
            None
        }
    };

    if let Some(ref python) = python {
        for module in ["torch", "librosa", "soundfile"] {
            print!("  {:<15}", format!("{}:", module));
            let check = Command::new(python)
                .args(["-c", &format!("import {m}; print(getattr({m}, '__version__', 'installed'))", m = module)])
                .output();
            match check {
                Ok(out) if out.status.success() => {
                    println!("OK ({})", String::from_utf8_lossy(&out.stdout).trim());
                }
                _ => {
                    println!("NOT INSTALLED");
                    all_ok = false;
                }
            }
        }

        print!("  cuda:          ");
        let check = Command::new(python)
            .args(["-c", "import torch; print(torch.cuda.is_available())"])
            .output();
        match check {
            Ok(out) if out.status.success() && String::from_utf8_lossy(&out.stdout).trim() == "True" => {
                println!("available");
            }
            Ok(out) if out.status.success() => println!("not available (inference will run on CPU)"),
            _ => println!("unknown"),
        }
    }

    // Check the DiffusionSVC checkout
    print!("DiffusionSVC:    ");
    if workdir.join("tools/infer_tools.py").exists() {
        println!("OK ({})", workdir.display());
    } else {
        println!("NOT FOUND in {}", workdir.display());
        println!("                 Set inference.workdir to the DiffusionSVC checkout");
        all_ok = false;
    }

    if config.inference.engine == EngineKind::Command {
        print!("  {:<15}", format!("{}:", config.inference.script.display()));
        if workdir.join(&config.inference.script).exists() {
            println!("OK");
        } else {
            println!("NOT FOUND");
            all_ok = false;
        }
    }

    // Check presets
    print!("presets:         ");
    match PresetCatalog::load(&config.presets.path) {
        Ok(catalog) if catalog.is_empty() => {
            println!("none ({}); requests must supply combine_model", config.presets.path.display());
        }
        Ok(catalog) => {
            println!("{} loaded from {}", catalog.len(), config.presets.path.display());
            for name in catalog.names() {
                let Some(preset) = catalog.get(name) else { continue };
                let model = workdir.join(&preset.model_path);
                if model.exists() {
                    println!("  {:<15}OK", name);
                } else {
                    println!("  {:<15}model missing: {}", name, model.display());
                    all_ok = false;
                }
            }
        }
        Err(e) => {
            println!("INVALID");
            println!("                 {}", e);
            all_ok = false;
        }
    }

    println!();
    if all_ok {
        println!("All dependencies OK!");
    } else {
        println!("Some dependencies are missing. See above for details.");
    }

    Ok(())
}
