use super::*;
use crate::script::reader::BlockReader;

fn build(script: &str) -> VidmasterResult<Operation> {
    let block = BlockReader::new(script)
        .next()
        .expect("script has one block");
    Operation::from_block(&block)
}

#[test]
fn define_image_with_duration() {
    let op = build("#do define\nname = a\ntype = image\nsource = /x.png\nduration = 5\n#end\n")
        .unwrap();
    assert_eq!(
        op,
        Operation::Define(Define {
            name: "a".to_owned(),
            media_type: MediaKind::Image,
            source_path: PathBuf::from("/x.png"),
            has_audio: false,
            duration: Some(5),
            duration_from: None,
        })
    );
    assert_eq!(op.output(), Some("a"));
    assert!(op.inputs().is_empty());
}

#[test]
fn define_video_with_audio_and_duration_from() {
    let op = build(
        "#do define\nname = v\ntype = video\nsource = clips/talk.mp4\nhasaudio = 1\nduration_from = bg\n#end\n",
    )
    .unwrap();
    let Operation::Define(def) = &op else {
        panic!("expected define");
    };
    assert_eq!(def.media_type, MediaKind::Video);
    assert!(def.has_audio);
    assert_eq!(def.duration_from.as_deref(), Some("bg"));
    assert_eq!(op.inputs(), vec!["bg"]);

    let op = build(
        "#do define\nname = v\ntype = image\nsource = /x.png\nduration = 2\nduration_from = bg\n#end\n",
    )
    .unwrap();
    assert!(op.inputs().is_empty());
}

#[test]
fn define_with_unknown_media_type_is_unknown_kind() {
    let err = build("#do define\nname = a\ntype = hologram\nsource = /x\n#end\n").unwrap_err();
    assert!(matches!(err, VidmasterError::UnknownKind { ref token, line: 1 } if token == "hologram"));
}

#[test]
fn define_requires_name_type_and_source() {
    for (script, field) in [
        ("#do define\ntype = image\nsource = /x\n#end\n", "name"),
        ("#do define\nname = a\nsource = /x\n#end\n", "type"),
        ("#do define\nname = a\ntype = image\n#end\n", "source"),
    ] {
        let err = build(script).unwrap_err();
        assert!(
            matches!(err, VidmasterError::MissingField { field: ref f, .. } if f == field),
            "{script}"
        );
    }
}

#[test]
fn resize_effect() {
    let op = build("#do resize\nclip = a\nout = b\nheight = 100\nwidth = 200\n#end\n").unwrap();
    assert_eq!(
        op,
        Operation::Effect(EffectOp {
            input_clip: "a".to_owned(),
            output_name: "b".to_owned(),
            effect: Effect::Resize {
                height: Some(100),
                width: Some(200),
            },
        })
    );
    assert_eq!(op.token(), "resize");
    assert_eq!(op.inputs(), vec!["a"]);
    assert_eq!(op.output(), Some("b"));
}

#[test]
fn margin_and_position_effects() {
    let op = build(
        "#do margin\nclip = a\nout = m\nsize = 10\nopacity = 1\nred = 255\ngreen = 0\nblue = 12\n#end\n",
    )
    .unwrap();
    let Operation::Effect(EffectOp {
        effect: Effect::Margin(margin),
        ..
    }) = op
    else {
        panic!("expected margin");
    };
    assert_eq!(margin.size, Some(10));
    assert_eq!(margin.red, Some(255));
    assert_eq!(margin.blue, Some(12));

    let op = build("#do position\nclip = a\nout = p\nx = 4\n#end\n").unwrap();
    assert_eq!(op.token(), "position");
    let Operation::Effect(EffectOp { effect, .. }) = op else {
        panic!("expected effect");
    };
    assert_eq!(
        effect,
        Effect::Position {
            x: Some(4),
            y: None
        }
    );
}

#[test]
fn effect_requires_clip_and_out() {
    let err = build("#do resize\nout = b\n#end\n").unwrap_err();
    assert!(matches!(err, VidmasterError::MissingField { ref field, .. } if field == "clip"));
    let err = build("#do resize\nclip = a\n#end\n").unwrap_err();
    assert!(matches!(err, VidmasterError::MissingField { ref field, .. } if field == "out"));
}

#[test]
fn mix_variants() {
    let op = build("#do concatenate\nclips = intro main outro\nout = full\n#end\n").unwrap();
    assert_eq!(op.token(), "concatenate");
    assert_eq!(op.inputs(), vec!["intro", "main", "outro"]);

    let op =
        build("#do composition\nclips = bg fg\nout = comp\nheight = 720\nwidth = 1280\n#end\n")
            .unwrap();
    assert_eq!(
        op,
        Operation::Mix(Mix {
            output_name: "comp".to_owned(),
            kind: MixKind::Composite {
                input_clips: vec!["bg".to_owned(), "fg".to_owned()],
                size: Some(Canvas {
                    width: 1280,
                    height: 720
                }),
            },
        })
    );

    let op = build("#do composition\nclips = bg fg\nout = comp\n#end\n").unwrap();
    assert!(matches!(
        op,
        Operation::Mix(Mix { kind: MixKind::Composite { size: None, .. }, .. })
    ));

    let op = build("#do setaudio\nclip = comp\naudio = music\nout = final\n#end\n").unwrap();
    assert_eq!(op.token(), "setaudio");
    assert_eq!(op.inputs(), vec!["comp", "music"]);
}

#[test]
fn mix_requires_its_inputs() {
    let err = build("#do concatenate\nout = full\n#end\n").unwrap_err();
    assert!(matches!(err, VidmasterError::MissingField { ref field, .. } if field == "clips"));
    let err = build("#do setaudio\nclip = v\nout = full\n#end\n").unwrap_err();
    assert!(matches!(err, VidmasterError::MissingField { ref field, .. } if field == "audio"));
}

#[test]
fn composition_size_needs_both_dimensions() {
    let err = build("#do composition\nclips = a\nwidth = 640\nout = c\n#end\n").unwrap_err();
    assert!(matches!(
        err,
        VidmasterError::MissingField { ref kind, ref field, line: 1 }
            if kind == "composition" && field == "height"
    ));
    let err = build("#do composition\nclips = a\nheight = 480\nout = c\n#end\n").unwrap_err();
    assert!(matches!(
        err,
        VidmasterError::MissingField { ref field, .. } if field == "width"
    ));
}

#[test]
fn subclip_with_and_without_end() {
    let op = build("#do subclip\nclip = v\nstart = 0:0:10\nend = 0:1:0\nout = cut\n#end\n")
        .unwrap();
    let Operation::Subclip(sub) = op else {
        panic!("expected subclip");
    };
    assert_eq!(sub.start, Timestamp::new(0, 0, 10));
    assert_eq!(sub.end, Some(Timestamp::new(0, 1, 0)));

    let op = build("#do subclip\nclip = v\nstart = 0:0:10\nout = cut\n#end\n").unwrap();
    let Operation::Subclip(sub) = op else {
        panic!("expected subclip");
    };
    assert_eq!(sub.end, None);
}

#[test]
fn export_defaults_preset_to_medium() {
    let op = build("#do export\nclip = b\nout = /tmp/o.mp4\nfps = 30\ncodec = libx264\n#end\n")
        .unwrap();
    let Operation::Export(export) = op else {
        panic!("expected export");
    };
    assert_eq!(export.preset, DEFAULT_PRESET);
    assert_eq!(export.preset, "medium");
    assert_eq!(export.fps, 30);
    assert_eq!(export.threads, None);
    assert!(export.extra_params.is_empty());
}

#[test]
fn export_keeps_extra_params_in_order() {
    let op = build(
        "#do export\nclip = b\nout = o.mp4\nfps = 25\ncodec = libx264\npreset = slow\nthreads = 4\nparams = -crf 18 -tune film\n#end\n",
    );
    // `-` is outside the value character class.
    assert!(matches!(op, Err(VidmasterError::Parse { line: 8, .. })));

    let op = build(
        "#do export\nclip = b\nout = o.mp4\nfps = 25\ncodec = libx264\npreset = slow\nthreads = 4\nparams = crf:18 tune film\n#end\n",
    )
    .unwrap();
    let Operation::Export(export) = op else {
        panic!("expected export");
    };
    assert_eq!(export.preset, "slow");
    assert_eq!(export.threads, Some(4));
    assert_eq!(export.extra_params, vec!["crf:18", "tune", "film"]);
}

#[test]
fn unknown_block_kind_fails_fast() {
    let err = build("#do frobnicate\nanything = 1\n#end\n").unwrap_err();
    assert!(matches!(err, VidmasterError::UnknownKind { ref token, line: 1 } if token == "frobnicate"));
}

#[test]
fn unknown_kind_is_reported_before_line_errors() {
    let err = build("#do frobnicate\nbogus-no-equals\n#end\n").unwrap_err();
    assert!(matches!(err, VidmasterError::UnknownKind { .. }));
}

#[test]
fn block_kind_tokens_round_trip() {
    for kind in BlockKind::ALL {
        assert_eq!(BlockKind::from_token(kind.token()), Some(kind));
    }
    assert_eq!(BlockKind::from_token("concatenation"), None);
}

#[test]
fn operations_serialize_with_tags() {
    let op = build("#do resize\nclip = a\nout = b\nwidth = 200\n#end\n").unwrap();
    let step = Step { line: 1, op };
    let json = serde_json::to_value(&step).unwrap();
    assert_eq!(json["op"], "effect");
    assert_eq!(json["line"], 1);
    assert_eq!(json["effect"]["kind"], "resize");
    assert_eq!(json["effect"]["width"], 200);
}
